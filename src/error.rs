use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("Math error - arithmetic overflow")]
    ArithmeticOverflow,
    #[error("Math error - arithmetic underflow")]
    ArithmeticUnderflow,
    #[error("LiquidityMath error - liquidity overflow")]
    LiquidityOverflow,
    #[error("LiquidityMath error - liquidity underflow")]
    LiquidityUnderflow,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - sqrtPrice out of bounds")]
    SqrtPriceOutOfBounds,
    #[error("State error - sqrtPrice is 0")]
    SqrtPriceIsZero,
    #[error("State error - sqrtRatio is 0")]
    SqrtRatioIsZero,

    #[error("State error - tick out of range")]
    TickOutOfRange,

    #[error("State error - liquidity is 0")]
    LiquidityIsZero,

    #[error("State error - requested amount exceeds pool reserves")]
    InsufficientReserves,
}

/// Precondition and invariant failures raised by the pool state machines.
///
/// Every variant is raised before any reserve, ledger, tick or position
/// change is committed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool error - insufficient A amount")]
    InsufficientAAmount,
    #[error("Pool error - insufficient B amount")]
    InsufficientBAmount,
    #[error("Pool error - insufficient amount")]
    InsufficientAmount,
    #[error("Pool error - insufficient liquidity")]
    InsufficientLiquidity,
    #[error("Pool error - insufficient liquidity minted")]
    InsufficientLiquidityMinted,
    #[error("Pool error - insufficient liquidity burned")]
    InsufficientLiquidityBurned,
    #[error("Pool error - minimum liquidity is locked")]
    LockedLiquidity,
    #[error("Pool error - insufficient output amount")]
    InsufficientOutputAmount,
    #[error("Pool error - insufficient input amount")]
    InsufficientInputAmount,
    #[error("Pool error - recipient is a token address")]
    InvalidToAddress,
    #[error("Pool error - token {0} is not part of this pool")]
    InvalidToken(String),
    #[error("Pool error - insufficient {0} balance in ledger")]
    InsufficientBalance(String),
    #[error("Pool error - deposited amounts do not match ledger balances")]
    MintAmountMismatch,
    #[error("Pool error - constant product invariant violated")]
    InvariantViolation,

    #[error("Pool error - already initialized")]
    AlreadyInitialized,
    #[error("Pool error - not initialized")]
    NotInitialized,
    #[error("Pool error - invalid tick range [{0}, {1}]")]
    InvalidTickRange(i32, i32),
    #[error("Pool error - tick {0} is not a multiple of the tick spacing")]
    TickNotSpaced(i32),
    #[error("Pool error - position not found")]
    PositionNotFound,
    #[error("Pool error - position has no liquidity")]
    NoPositionLiquidity,
    #[error("Pool error - liquidity amount is 0")]
    ZeroLiquidity,
    #[error("Pool error - amount specified is 0")]
    ZeroAmountSpecified,
    #[error("Pool error - invalid sqrt price limit")]
    InvalidPriceLimit,
    #[error("Pool error - invalid protocol fee {0}/{1}")]
    InvalidFeeProtocol(u8, u8),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry error - pool {0} already exists")]
    PoolAlreadyExists(String),
    #[error("Registry error - unknown pool {0}")]
    UnknownPool(String),
    #[error("Registry error - invalid pool config: {0}")]
    InvalidPoolConfig(String),
    #[error("Registry error - failed to load config: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    PoolError(#[from] crate::error::PoolError),

    #[error(transparent)]
    RegistryError(#[from] crate::error::RegistryError),
}
