//! Account abstraction (ERC-4337)-related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
}

/// Account factories
pub mod factory {
    /// Address of the canonical simple account factory
    pub const SIMPLE_ACCOUNT_FACTORY: &str = "0x9406Cc6185a346906296840746125a0E44976454";
}

/// Fee estimation
pub mod fee {
    /// Numerator of the safety buffer applied to estimated fees
    pub const FEE_BUFFER_NUMERATOR: u64 = 125;
    /// Denominator of the safety buffer applied to estimated fees
    pub const FEE_BUFFER_DENOMINATOR: u64 = 100;
}

/// Gas limits taken from the bundler's estimation
pub mod gas {
    /// Multiplier applied to estimated verification and call gas limits
    pub const GAS_LIMIT_MULTIPLIER: u64 = 2;
    /// Reserve added on top of the estimated pre-verification gas
    pub const PRE_VERIFICATION_SAFE_RESERVE: u64 = 1_000;
}

/// Dummy signatures sized to match the real signing schemes, so gas estimation against an
/// unsigned operation is representative
pub mod dummy_signature {
    /// 65-byte ECDSA signature with saturated r/s and a valid recovery id
    pub const ECDSA: &str = "0xfffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe1c";
}
