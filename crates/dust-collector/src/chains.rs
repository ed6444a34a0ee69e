/// Address/runtime family of a destination chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    Solana,
}

/// A Wormhole-indexed chain reachable through CCTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WormholeChain {
    /// Wormhole chain id, as used by the executor API and the collector.
    pub id: u16,
    pub name: &'static str,
    pub family: ChainFamily,
    /// Circle CCTP domain.
    pub cctp_domain: u32,
}

/// Wormhole chain id of Solana.
pub const SOLANA: u16 = 1;

const CHAINS: &[WormholeChain] = &[
    WormholeChain { id: SOLANA, name: "Solana", family: ChainFamily::Solana, cctp_domain: 5 },
    WormholeChain { id: 2, name: "Ethereum", family: ChainFamily::Evm, cctp_domain: 0 },
    WormholeChain { id: 5, name: "Polygon", family: ChainFamily::Evm, cctp_domain: 7 },
    WormholeChain { id: 6, name: "Avalanche", family: ChainFamily::Evm, cctp_domain: 1 },
    WormholeChain { id: 23, name: "Arbitrum", family: ChainFamily::Evm, cctp_domain: 3 },
    WormholeChain { id: 24, name: "Optimism", family: ChainFamily::Evm, cctp_domain: 2 },
    WormholeChain { id: 30, name: "Base", family: ChainFamily::Evm, cctp_domain: 6 },
    WormholeChain { id: 44, name: "Unichain", family: ChainFamily::Evm, cctp_domain: 10 },
    WormholeChain { id: 10002, name: "Sepolia", family: ChainFamily::Evm, cctp_domain: 0 },
    WormholeChain { id: 10003, name: "Arbitrum Sepolia", family: ChainFamily::Evm, cctp_domain: 3 },
    WormholeChain { id: 10004, name: "Base Sepolia", family: ChainFamily::Evm, cctp_domain: 6 },
    WormholeChain { id: 10005, name: "Optimism Sepolia", family: ChainFamily::Evm, cctp_domain: 2 },
];

/// Looks up a chain by Wormhole id.
pub fn get_chain(id: u16) -> Option<&'static WormholeChain> {
    CHAINS.iter().find(|c| c.id == id)
}

/// All known chains.
pub fn supported_chains() -> &'static [WormholeChain] {
    CHAINS
}
