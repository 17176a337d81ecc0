use static_assertions::const_assert;

/// log2 of the number of bytes in a kilobyte
pub const LOG_BYTES_IN_KBYTE: u8 = 10;
/// The number of bytes in a kilobyte
pub const BYTES_IN_KBYTE: usize = 1 << LOG_BYTES_IN_KBYTE;

/// log2 of the number of bytes in a megabyte
pub const LOG_BYTES_IN_MBYTE: u8 = 20;
/// The number of bytes in a megabyte
pub const BYTES_IN_MBYTE: usize = 1 << LOG_BYTES_IN_MBYTE;

#[cfg(target_pointer_width = "32")]
/// log2 of the number of bytes in an address
pub const LOG_BYTES_IN_ADDRESS: u8 = 2;
#[cfg(target_pointer_width = "64")]
/// log2 of the number of bytes in an address
pub const LOG_BYTES_IN_ADDRESS: u8 = 3;
/// The number of bytes in an address
pub const BYTES_IN_ADDRESS: usize = 1 << LOG_BYTES_IN_ADDRESS;

/// log2 of the number of bytes in a card. Cross-region writes are recorded at this granularity.
pub const LOG_BYTES_IN_CARD: usize = 9;
/// The number of bytes in a card.
pub const BYTES_IN_CARD: usize = 1 << LOG_BYTES_IN_CARD;

/// log2 of the smallest region size we accept.
pub const LOG_MIN_REGION_SIZE: usize = LOG_BYTES_IN_MBYTE as usize;
/// log2 of the largest region size we accept.
pub const LOG_MAX_REGION_SIZE: usize = LOG_BYTES_IN_MBYTE as usize + 5;
/// The smallest region size (1MB).
pub const MIN_REGION_SIZE: usize = 1 << LOG_MIN_REGION_SIZE;
/// The largest region size (32MB).
pub const MAX_REGION_SIZE: usize = 1 << LOG_MAX_REGION_SIZE;
/// The default region size.
pub const DEFAULT_REGION_SIZE: usize = MIN_REGION_SIZE;

#[cfg(target_pointer_width = "32")]
/// The default heap base. Regions are laid out contiguously from here.
pub const DEFAULT_HEAP_START: usize = 0x4000_0000;
#[cfg(target_pointer_width = "64")]
/// The default heap base. Regions are laid out contiguously from here.
pub const DEFAULT_HEAP_START: usize = 0x2000_0000_0000;

// A region always holds a whole number of cards, and the heap base is region aligned.
const_assert!(MIN_REGION_SIZE % BYTES_IN_CARD == 0);
const_assert!(DEFAULT_HEAP_START % MAX_REGION_SIZE == 0);
const_assert!(DEFAULT_REGION_SIZE >= MIN_REGION_SIZE && DEFAULT_REGION_SIZE <= MAX_REGION_SIZE);
