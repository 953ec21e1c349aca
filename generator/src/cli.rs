use std::path::PathBuf;

use clap::Parser;
use xcg_generator::{
    ArtifactGrouping, CaseTransform, GeneratorConfig, ReservedWordPolicy, SubstitutionGroups,
};

#[derive(Parser)]
#[clap(version, about)]
pub struct Cli {
    #[clap(value_parser, required = true, help = "The schema files or URLs to generate from")]
    pub inputs: Vec<String>,

    #[clap(short, long, default_value = "generated", help = "Output directory")]
    pub output: PathBuf,

    #[clap(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[clap(long, help = "Map date and dateTime to an offset-carrying timestamp")]
    pub with_time_zone: bool,

    #[clap(
        long,
        help = "Map date to a timestamp instead of a date-only type (ignored with --with-time-zone)"
    )]
    pub no_native_dates: bool,

    #[clap(long, value_enum, default_value_t)]
    pub case: CaseTransform,

    #[clap(long, value_enum, default_value_t)]
    pub reserved_words: ReservedWordPolicy,

    #[clap(long, value_enum, default_value_t)]
    pub grouping: ArtifactGrouping,

    #[clap(long, value_enum, default_value_t)]
    pub substitution_groups: SubstitutionGroups,

    #[clap(long, help = "Fail instead of creating a missing output directory")]
    pub no_create_dirs: bool,

    #[clap(
        long = "namespace",
        value_name = "URI=NAME",
        value_parser = parse_namespace_mapping,
        help = "Module name for a namespace URI (an empty URI stands for no namespace)"
    )]
    pub namespaces: Vec<(String, String)>,

    #[clap(long, help = "Only print the files that would be written")]
    pub dry_run: bool,
}

fn parse_namespace_mapping(value: &str) -> Result<(String, String), String> {
    match value.rsplit_once('=') {
        Some((uri, name)) if !name.is_empty() => Ok((uri.to_string(), name.to_string())),
        _ => Err(format!("expected URI=NAME, got {value:?}")),
    }
}

impl Cli {
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            with_time_zone: self.with_time_zone,
            native_date_support: !self.no_native_dates,
            case_transform: self.case,
            reserved_word_policy: self.reserved_words,
            artifact_grouping: self.grouping,
            create_destination_if_missing: !self.no_create_dirs,
            substitution_groups: self.substitution_groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_mappings_split_at_the_last_equals_sign() {
        assert_eq!(
            parse_namespace_mapping("urn:a=b=orders").unwrap(),
            ("urn:a=b".to_string(), "orders".to_string())
        );
        assert_eq!(
            parse_namespace_mapping("=unqualified").unwrap(),
            (String::new(), "unqualified".to_string())
        );
        assert!(parse_namespace_mapping("urn:a").is_err());
        assert!(parse_namespace_mapping("urn:a=").is_err());
    }

    #[test]
    fn flags_map_to_config() {
        let cli = Cli::parse_from([
            "xcg",
            "orders.xsd",
            "--with-time-zone",
            "--grouping",
            "per-type",
            "--reserved-words",
            "suffix",
            "--namespace",
            "urn:orders=orders",
        ]);
        let config = cli.config();
        assert!(config.with_time_zone);
        assert!(config.native_date_support);
        assert_eq!(config.artifact_grouping, ArtifactGrouping::PerType);
        assert_eq!(config.reserved_word_policy, ReservedWordPolicy::Suffix);
        assert_eq!(cli.namespaces, [("urn:orders".to_string(), "orders".to_string())]);
    }
}
