pub const DEFAULT_WINDOW_SIZE: usize = 10;
/// Largest window a hypothesis test detector accepts; both windows are held in memory.
pub const MAX_WINDOW_SIZE: usize = 1 << 24;
pub const DEFAULT_P_VALUE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_AGREEMENT_PERCENTAGE: u32 = 1;
pub const DEFAULT_BATCH_WIDTH: usize = 500;
pub const DEFAULT_RESET_INSTANCES: usize = 30;
pub const DDM_MIN_INSTANCES: usize = 30;
pub const DDM_WARNING_LEVEL: f64 = 2.0;
pub const DDM_OUT_CONTROL_LEVEL: f64 = 3.0;
pub const DEFAULT_INSTANCE_LIMIT: u64 = 100_000_000;
pub const DEFAULT_SAMPLE_FREQUENCY: u64 = 100_000;
pub const DEFAULT_DELAY_LENGTH: usize = 1000;
pub const DEFAULT_INITIAL_WINDOW: usize = 1000;
pub const BYTES_PER_GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;
/// Number of entries in a detector vote vector: change, warning, delay, estimation.
pub const VOTE_LENGTH: usize = 4;
