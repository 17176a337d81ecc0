use crate::util::constants::*;
use std::default::Default;

fn always_valid<T>(_: &T) -> bool {
    true
}

fn region_size_valid(v: &usize) -> bool {
    v.is_power_of_two() && *v >= MIN_REGION_SIZE && *v <= MAX_REGION_SIZE
}

/// The prefix of environment variables that override option defaults.
pub const ENV_PREFIX: &str = "REMSET_";

macro_rules! options {
    ($($(#[$outer:meta])* $name:ident: $type:ty[$validator:expr] = $default:expr),*,) => [
        options!($($(#[$outer])* $name: $type[$validator] = $default),*);
    ];
    ($($(#[$outer:meta])* $name:ident: $type:ty[$validator:expr] = $default:expr),*) => [
        /// Tunables for remembered-set tracking. Each option has a type, a validator and a
        /// default. Defaults can be overridden with `REMSET_<OPTION_NAME>` environment
        /// variables, or programmatically with [`Options::set_from_str`].
        #[derive(Clone, Debug)]
        pub struct Options {
            $($(#[$outer])* pub $name: $type),*
        }
        impl Options {
            /// Set an option by its snake-case name. Returns false (and keeps the old value)
            /// if the value cannot be parsed or fails validation.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> bool {
                match s {
                    // Parse the given value from str (by env vars or by calling set_from_str()) to the right type
                    $(stringify!($name) => if let Ok(ref val) = val.parse::<$type>() {
                        // Validate
                        let validate_fn = $validator;
                        let is_valid = validate_fn(val);
                        if is_valid {
                            // Only set value if valid.
                            self.$name = val.clone();
                        } else {
                            warn!("Unable to set {}={:?}. Invalid value. Default value will be used.", s, val);
                        }
                        is_valid
                    } else {
                        warn!("Unable to set {}={:?}. Cant parse value. Default value will be used.", s, val);
                        false
                    })*
                    _ => {
                        warn!("Unknown option {}", s);
                        false
                    }
                }
            }

            /// Options with built-in defaults, ignoring the environment.
            pub fn builtin() -> Self {
                Options {
                    $($name: $default),*
                }
            }
        }
        impl Default for Options {
            fn default() -> Self {
                let mut options = Options::builtin();

                // If we have env vars that start with REMSET_ and match any option (such as REMSET_REGION_SIZE),
                // we set the option to its value (if it is a valid value). Otherwise, use the default value.
                for (key, val) in std::env::vars() {
                    // strip the prefix, and get the lower case string
                    if let Some(rest_of_key) = key.strip_prefix(ENV_PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => { options.set_from_str(lowercase, &val); },)*
                            _ => {}
                        }
                    }
                }
                options
            }
        }
    ]
}

options! {
    /// The size of a heap region in bytes. Must be a power of two between 1MB and 32MB.
    region_size:                     usize [region_size_valid] = DEFAULT_REGION_SIZE,
    /// The maximum number of regions managed by a heap.
    max_regions:                     usize [|v: &usize| *v > 0] = 2048,
    /// An old region is only worth a remembered set if its live bytes are below this
    /// percentage of the region size.
    mixed_gc_live_threshold_percent: usize [|v: &usize| *v <= 100] = 85,
    /// Try to reclaim dead humongous objects outside of full collections.
    eager_reclaim_humongous_objects: bool  [always_valid] = true,
    /// A humongous object whose remembered set holds more cards than this is not considered
    /// for eager reclaim.
    eager_reclaim_remset_threshold:  usize [always_valid] = 20,
}

impl Options {
    /// log2 of the region size.
    pub fn log_region_size(&self) -> usize {
        self.region_size.trailing_zeros() as usize
    }

    /// The number of cards in a region.
    pub fn cards_per_region(&self) -> usize {
        self.region_size >> LOG_BYTES_IN_CARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util::{serial_test, with_cleanup};

    #[test]
    fn no_env_var() {
        serial_test(|| {
            let options = Options::default();
            assert_eq!(options.region_size, DEFAULT_REGION_SIZE);
            assert_eq!(options.mixed_gc_live_threshold_percent, 85);
            assert!(options.eager_reclaim_humongous_objects);
        })
    }

    #[test]
    fn with_valid_env_var() {
        serial_test(|| {
            with_cleanup(
                || {
                    std::env::set_var("REMSET_MIXED_GC_LIVE_THRESHOLD_PERCENT", "65");

                    let options = Options::default();
                    assert_eq!(options.mixed_gc_live_threshold_percent, 65);
                },
                || {
                    std::env::remove_var("REMSET_MIXED_GC_LIVE_THRESHOLD_PERCENT");
                },
            )
        })
    }

    #[test]
    fn with_multiple_valid_env_vars() {
        serial_test(|| {
            with_cleanup(
                || {
                    std::env::set_var("REMSET_REGION_SIZE", "4194304");
                    std::env::set_var("REMSET_EAGER_RECLAIM_HUMONGOUS_OBJECTS", "false");

                    let options = Options::default();
                    assert_eq!(options.region_size, 4 * BYTES_IN_MBYTE);
                    assert_eq!(options.log_region_size(), 22);
                    assert!(!options.eager_reclaim_humongous_objects);
                },
                || {
                    std::env::remove_var("REMSET_REGION_SIZE");
                    std::env::remove_var("REMSET_EAGER_RECLAIM_HUMONGOUS_OBJECTS");
                },
            )
        })
    }

    #[test]
    fn with_invalid_env_var_value() {
        serial_test(|| {
            with_cleanup(
                || {
                    // Not a power of two, so the default is kept.
                    std::env::set_var("REMSET_REGION_SIZE", "3000000");
                    // Cannot be parsed.
                    std::env::set_var("REMSET_MIXED_GC_LIVE_THRESHOLD_PERCENT", "abc");

                    let options = Options::default();
                    assert_eq!(options.region_size, DEFAULT_REGION_SIZE);
                    assert_eq!(options.mixed_gc_live_threshold_percent, 85);
                },
                || {
                    std::env::remove_var("REMSET_REGION_SIZE");
                    std::env::remove_var("REMSET_MIXED_GC_LIVE_THRESHOLD_PERCENT");
                },
            )
        })
    }

    #[test]
    fn with_invalid_env_var_key() {
        serial_test(|| {
            with_cleanup(
                || {
                    std::env::set_var("REMSET_ABC", "42");

                    let options = Options::default();
                    assert_eq!(options.max_regions, 2048);
                },
                || {
                    std::env::remove_var("REMSET_ABC");
                },
            )
        })
    }

    #[test]
    fn set_from_str_validates() {
        let mut options = Options::builtin();
        assert!(options.set_from_str("mixed_gc_live_threshold_percent", "50"));
        assert_eq!(options.mixed_gc_live_threshold_percent, 50);
        assert!(!options.set_from_str("mixed_gc_live_threshold_percent", "101"));
        assert_eq!(options.mixed_gc_live_threshold_percent, 50);
        assert!(!options.set_from_str("no_such_option", "1"));
        assert_eq!(options.cards_per_region(), DEFAULT_REGION_SIZE / BYTES_IN_CARD);
    }
}
