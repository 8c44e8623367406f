//! Built-in node lists, used on first run and by `NodeStore::reset`

use super::types::{Node, NodeGroup, Origin};

pub fn default_nodes(group: NodeGroup) -> Vec<Node> {
    match group {
        NodeGroup::Adm => vec![
            Node::new(Origin::https("clown.adamant.im")),
            Node::new(Origin::https("lake.adamant.im")),
            Node::new(Origin::https("endless.adamant.im"))
                .with_alt_origin(Origin::http("149.102.157.15", 36666)),
            Node::new(Origin::https("bid.adamant.im")),
            Node::new(Origin::https("unusual.adamant.im")),
            Node::new(Origin::https("debate.adamant.im"))
                .with_alt_origin(Origin::http("95.216.161.113", 36666)),
        ],
        NodeGroup::Btc => vec![
            Node::new(Origin::https("btcnode1.adamant.im"))
                .with_alt_origin(Origin::http("176.9.38.204", 44099)),
            Node::new(Origin::https("btcnode3.adamant.im"))
                .with_alt_origin(Origin::http("195.201.242.108", 44099)),
        ],
        NodeGroup::Eth => vec![
            Node::new(Origin::https("ethnode2.adamant.im"))
                .with_alt_origin(Origin::http("95.216.114.252", 44099)),
            Node::new(Origin::https("ethnode3.adamant.im"))
                .with_alt_origin(Origin::http("46.4.37.157", 44099)),
        ],
        NodeGroup::Lsk => vec![
            Node::new(Origin::https("lisknode3.adamant.im")),
            Node::new(Origin::https("lisknode4.adamant.im")),
        ],
        NodeGroup::Doge => vec![
            Node::new(Origin::https("dogenode1.adamant.im"))
                .with_alt_origin(Origin::http("5.9.99.62", 44099)),
            Node::new(Origin::https("dogenode2.adamant.im"))
                .with_alt_origin(Origin::http("176.9.32.126", 44098)),
        ],
        NodeGroup::Dash => vec![
            Node::new(Origin::https("dashnode1.adamant.im"))
                .with_alt_origin(Origin::http("45.85.147.224", 44099)),
            Node::new(Origin::https("dashnode2.adamant.im"))
                .with_alt_origin(Origin::http("207.180.210.95", 44099)),
        ],
        NodeGroup::Ipfs => vec![
            Node::new(Origin::https("ipfs4.adm.im"))
                .with_alt_origin(Origin::http("95.216.45.88", 44099)),
            Node::new(Origin::https("ipfs5.adamant.im"))
                .with_alt_origin(Origin::http("62.72.43.99", 44099)),
        ],
        NodeGroup::InfoService => vec![
            Node::new(Origin::https("info.adamant.im"))
                .with_alt_origin(Origin::http("88.198.156.44", 44099)),
            Node::new(Origin::https("info2.adm.im"))
                .with_alt_origin(Origin::http("207.180.210.95", 33088)),
        ],
    }
}
