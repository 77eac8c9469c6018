use std::collections::BTreeSet;

use crate::domain::MetadataRecord;

pub const CHANNELS_KEY: &str = "channels";
pub const ORIGINAL_CHANNELS_KEY: &str = "original_channels";

/// The canonical channel list for a group and how its files map to
/// channels. `pre_split` means the group consists of single-channel records
/// split out of a multi-channel acquisition: one file per channel, with the
/// split marked by `original_channels` on the records. Otherwise one file
/// may serve several channels at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    pub channels: Vec<String>,
    pub pre_split: bool,
}

pub fn split_channels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

pub fn resolve<'a, I>(records: I) -> ChannelLayout
where
    I: IntoIterator<Item = &'a MetadataRecord>,
{
    let mut split_marker = false;
    let mut all_single = true;
    let mut raw_values: Vec<&str> = Vec::new();

    for record in records {
        if record.contains(ORIGINAL_CHANNELS_KEY) {
            split_marker = true;
        }
        if let Some(raw) = record.get(CHANNELS_KEY) {
            if raw.contains(',') {
                all_single = false;
            }
            raw_values.push(raw);
        }
    }

    let pre_split = split_marker && all_single;
    let mut channels = BTreeSet::new();
    for raw in &raw_values {
        if pre_split {
            let name = raw.trim();
            if !name.is_empty() {
                channels.insert(name.to_string());
            }
        } else {
            for name in split_channels(raw) {
                channels.insert(name);
            }
        }
    }

    ChannelLayout {
        channels: channels.into_iter().collect(),
        pre_split,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> MetadataRecord {
        MetadataRecord::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn resolve_multi_channel_native_unions_and_sorts() {
        let records = [
            record(&[("channels", "GFP,DAPI")]),
            record(&[("channels", "DAPI,Phalloidin")]),
        ];
        let layout = resolve(records.iter());
        assert!(!layout.pre_split);
        assert_eq!(layout.channels, vec!["DAPI", "GFP", "Phalloidin"]);
    }

    #[test]
    fn resolve_pre_split_requires_marker_and_single_names() {
        let records = [
            record(&[("channels", "DAPI"), ("original_channels", "DAPI,GFP")]),
            record(&[("channels", "GFP"), ("original_channels", "DAPI,GFP")]),
        ];
        let layout = resolve(records.iter());
        assert!(layout.pre_split);
        assert_eq!(layout.channels, vec!["DAPI", "GFP"]);
    }

    #[test]
    fn resolve_single_names_without_marker_stay_native() {
        let records = [record(&[("channels", "DAPI")]), record(&[("channels", "GFP")])];
        let layout = resolve(records.iter());
        assert!(!layout.pre_split);
        assert_eq!(layout.channels, vec!["DAPI", "GFP"]);
    }

    #[test]
    fn resolve_comma_list_defeats_pre_split() {
        // A marker on one record does not make a group pre-split while
        // another record still carries a multi-channel list.
        let records = [
            record(&[("channels", "DAPI"), ("original_channels", "DAPI,GFP")]),
            record(&[("channels", "DAPI,GFP")]),
        ];
        let layout = resolve(records.iter());
        assert!(!layout.pre_split);
        assert_eq!(layout.channels, vec!["DAPI", "GFP"]);
    }

    #[test]
    fn split_channels_trims_and_drops_empties() {
        assert_eq!(split_channels(" DAPI , GFP ,"), vec!["DAPI", "GFP"]);
    }
}
