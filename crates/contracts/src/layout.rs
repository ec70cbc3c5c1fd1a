//! FeatureLayout - fixed column order of synchronized feature rows

use serde::{Deserialize, Serialize};

use crate::{ChannelOrder, DeviceConfig};

/// One column of the feature vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSlot {
    /// Index into the configured device list
    pub device_index: usize,
    /// Index into that device's channels
    pub channel_index: usize,
    /// Column label (`{device}_{channel}`)
    pub label: String,
}

/// Ordered feature columns, derived once from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    slots: Vec<FeatureSlot>,
}

impl FeatureLayout {
    /// Build the layout for `devices` in the given order.
    ///
    /// `ChannelMajor` walks channel names in first-seen order and emits every
    /// device carrying that name, so the same physical quantity stays adjacent.
    pub fn new(devices: &[DeviceConfig], order: ChannelOrder) -> Self {
        let slot = |device_index: usize, channel_index: usize| {
            let device = &devices[device_index];
            FeatureSlot {
                device_index,
                channel_index,
                label: format!("{}_{}", device.id, device.channels[channel_index]),
            }
        };

        let slots = match order {
            ChannelOrder::DeviceMajor => devices
                .iter()
                .enumerate()
                .flat_map(|(d, device)| (0..device.channels.len()).map(move |c| (d, c)))
                .map(|(d, c)| slot(d, c))
                .collect(),
            ChannelOrder::ChannelMajor => {
                let mut names: Vec<&str> = Vec::new();
                for device in devices {
                    for channel in &device.channels {
                        if !names.contains(&channel.as_str()) {
                            names.push(channel);
                        }
                    }
                }
                let mut slots = Vec::new();
                for name in names {
                    for (d, device) in devices.iter().enumerate() {
                        if let Some(c) = device.channels.iter().position(|ch| ch == name) {
                            slots.push(slot(d, c));
                        }
                    }
                }
                slots
            }
        };

        Self { slots }
    }

    /// Feature vector width
    #[inline]
    pub fn dimension(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[FeatureSlot] {
        &self.slots
    }

    /// Column labels in order
    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.label.clone()).collect()
    }

    /// Assemble one feature row from per-device value vectors
    /// (indexed like the configured device list).
    pub fn assemble(&self, per_device: &[Vec<f64>]) -> Vec<f64> {
        self.slots
            .iter()
            .map(|s| per_device[s.device_index][s.channel_index])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, channels: &[&str]) -> DeviceConfig {
        DeviceConfig {
            id: id.into(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
            header_lines: 0,
            timestamp_column: None,
            source_columns: None,
        }
    }

    #[test]
    fn test_device_major() {
        let devices = vec![device("a", &["x", "y"]), device("b", &["x", "y"])];
        let layout = FeatureLayout::new(&devices, ChannelOrder::DeviceMajor);
        assert_eq!(layout.labels(), vec!["a_x", "a_y", "b_x", "b_y"]);
    }

    #[test]
    fn test_channel_major_keeps_quantities_adjacent() {
        let devices = vec![device("a", &["x", "y"]), device("b", &["x", "y", "q"])];
        let layout = FeatureLayout::new(&devices, ChannelOrder::ChannelMajor);
        assert_eq!(layout.labels(), vec!["a_x", "b_x", "a_y", "b_y", "b_q"]);
        assert_eq!(layout.dimension(), 5);
    }

    #[test]
    fn test_assemble() {
        let devices = vec![device("a", &["x", "y"]), device("b", &["x"])];
        let layout = FeatureLayout::new(&devices, ChannelOrder::ChannelMajor);
        let row = layout.assemble(&[vec![1.0, 2.0], vec![3.0]]);
        assert_eq!(row, vec![1.0, 3.0, 2.0]);
    }
}
