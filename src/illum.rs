use regex::Regex;

/// Correction-artifact file names encode their channel:
/// `<group-id>_Illum<Channel>.<ext>`, e.g. `P1_IllumDAPI.npy` or
/// `Plate1_Cycle01_IllumDNA.npy` (the cycle lands in the prefix). This is
/// the contract between correction producers and manifest synthesis; names
/// that do not match it carry no channel and are left out of the manifest.
const FILE_NAME_PATTERN: &str = r"^(.+)_Illum([A-Za-z0-9]+)\.([A-Za-z0-9]+)$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllumFileName {
    pub prefix: String,
    pub channel: String,
    pub extension: String,
}

pub fn parse_file_name(name: &str) -> Option<IllumFileName> {
    let base = name.rsplit('/').next().unwrap_or(name);
    let pattern = Regex::new(FILE_NAME_PATTERN).unwrap();
    let captures = pattern.captures(base)?;
    Some(IllumFileName {
        prefix: captures[1].to_string(),
        channel: captures[2].to_string(),
        extension: captures[3].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_name() {
        let parsed = parse_file_name("P1_IllumDAPI.npy").unwrap();
        assert_eq!(parsed.prefix, "P1");
        assert_eq!(parsed.channel, "DAPI");
        assert_eq!(parsed.extension, "npy");
    }

    #[test]
    fn parse_cycle_bearing_name() {
        let parsed = parse_file_name("Plate1_Cycle01_IllumDNA.npy").unwrap();
        assert_eq!(parsed.prefix, "Plate1_Cycle01");
        assert_eq!(parsed.channel, "DNA");
    }

    #[test]
    fn parse_uses_last_illum_marker() {
        let parsed = parse_file_name("Batch_IllumRun_P1_IllumGFP.npy").unwrap();
        assert_eq!(parsed.prefix, "Batch_IllumRun_P1");
        assert_eq!(parsed.channel, "GFP");
    }

    #[test]
    fn parse_strips_directory_components() {
        let parsed = parse_file_name("corrections/P1_IllumDAPI.npy").unwrap();
        assert_eq!(parsed.prefix, "P1");
    }

    #[test]
    fn non_matching_names_are_rejected() {
        assert_eq!(parse_file_name("P1_DAPI.npy"), None);
        assert_eq!(parse_file_name("P1_Illum.npy"), None);
        assert_eq!(parse_file_name("P1_IllumDAPI"), None);
    }
}
