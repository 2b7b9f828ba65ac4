//! Duplicate suppression for I/O readings

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::address::HardwareAddress;
use crate::config::XBeeConfig;
use crate::io_sample::SampleValue;

/// Remembers the last published value per (node, channel)
pub struct DuplicateFilter {
    filter_analog: bool,
    minimum_analog_change: u16,
    filter_digital: bool,
    last_published: Mutex<HashMap<(HardwareAddress, String), SampleValue>>,
}

impl DuplicateFilter {
    pub fn new(config: &XBeeConfig) -> Self {
        Self {
            filter_analog: config.filter_analog_duplicates,
            minimum_analog_change: config.minimum_analog_change,
            filter_digital: config.filter_digital_duplicates,
            last_published: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether `value` should be published and, if so, record it
    pub fn admit(&self, address: HardwareAddress, channel: &str, value: SampleValue) -> bool {
        let mut last = self.last_published.lock();
        let key = (address, channel.to_string());

        let duplicate = match (value, last.get(&key)) {
            (SampleValue::Analog(new), Some(SampleValue::Analog(old))) if self.filter_analog => {
                new.abs_diff(*old) < self.minimum_analog_change
            }
            (SampleValue::Digital(new), Some(SampleValue::Digital(old))) if self.filter_digital => {
                new == *old
            }
            _ => false,
        };

        if !duplicate {
            last.insert(key, value);
        }
        !duplicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE: HardwareAddress = HardwareAddress::new(0x1234);

    fn filter(min_change: u16) -> DuplicateFilter {
        DuplicateFilter::new(&XBeeConfig {
            minimum_analog_change: min_change,
            ..XBeeConfig::default()
        })
    }

    #[test]
    fn analog_threshold_is_relative_to_last_published() {
        let f = filter(10);
        assert!(f.admit(NODE, "AD0", SampleValue::Analog(100)));
        assert!(!f.admit(NODE, "AD0", SampleValue::Analog(109)));
        assert!(!f.admit(NODE, "AD0", SampleValue::Analog(91)));
        assert!(f.admit(NODE, "AD0", SampleValue::Analog(110)));
        // Compared against 110 now, not 100
        assert!(!f.admit(NODE, "AD0", SampleValue::Analog(115)));
    }

    #[test]
    fn default_threshold_drops_exact_repeats_only() {
        let f = filter(1);
        assert!(f.admit(NODE, "AD1", SampleValue::Analog(5)));
        assert!(!f.admit(NODE, "AD1", SampleValue::Analog(5)));
        assert!(f.admit(NODE, "AD1", SampleValue::Analog(6)));
    }

    #[test]
    fn digital_repeats_are_dropped_per_channel_and_node() {
        let f = filter(1);
        assert!(f.admit(NODE, "DIO0", SampleValue::Digital(true)));
        assert!(!f.admit(NODE, "DIO0", SampleValue::Digital(true)));
        assert!(f.admit(NODE, "DIO1", SampleValue::Digital(true)));
        assert!(f.admit(HardwareAddress::new(1), "DIO0", SampleValue::Digital(true)));
        assert!(f.admit(NODE, "DIO0", SampleValue::Digital(false)));
    }

    #[test]
    fn disabled_filters_pass_everything() {
        let f = DuplicateFilter::new(&XBeeConfig {
            filter_analog_duplicates: false,
            filter_digital_duplicates: false,
            ..XBeeConfig::default()
        });
        assert!(f.admit(NODE, "AD0", SampleValue::Analog(1)));
        assert!(f.admit(NODE, "AD0", SampleValue::Analog(1)));
        assert!(f.admit(NODE, "DIO2", SampleValue::Digital(false)));
        assert!(f.admit(NODE, "DIO2", SampleValue::Digital(false)));
    }
}
