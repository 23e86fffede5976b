//! Command-line surface.
//!
//! The seven positional arguments keep their historical meaning and never
//! abort the run: unknown tokens fall back to the defaults with a notice.
//! Named options override the configuration file.

use std::path::PathBuf;
use std::str::FromStr;

use camtrack_core::{DescriptorKind, DetectorKind, KindSelection, MatcherKind, SelectorKind};
use clap::Parser;

use crate::config::PipelineConfig;

/// Two-frame camera feature tracking over an image sequence
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "camtrack", version, about, long_about = None, allow_negative_numbers = true)]
pub struct Cli {
    /// SHITOMASI | HARRIS | FAST | BRISK | ORB | AKAZE | SIFT
    pub detector: Option<String>,
    /// BRISK | BRIEF | ORB | FREAK | AKAZE | SIFT
    pub descriptor: Option<String>,
    /// MAT_BF | MAT_FLANN
    pub matcher: Option<String>,
    /// SEL_NN | SEL_KNN
    pub selector: Option<String>,
    /// Save keypoint and match images (1 = on)
    pub visualize: Option<String>,
    /// Keep only the first 50 keypoints (1 = on)
    pub limit: Option<String>,
    /// Keep only keypoints on the preceding vehicle (1 = on)
    pub focus: Option<String>,

    /// TOML or JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub prefix: Option<String>,
    #[arg(long)]
    pub extension: Option<String>,
    #[arg(long)]
    pub start: Option<usize>,
    #[arg(long)]
    pub end: Option<usize>,
    /// Digits the frame index is zero-padded to
    #[arg(long)]
    pub fill_width: Option<usize>,
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Write per-frame reports as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Wait for Enter after every visualized frame
    #[arg(long)]
    pub interactive: bool,
    #[arg(long)]
    pub threads: Option<usize>,
    /// error | warn | info | debug | trace
    #[arg(long)]
    pub log_level: Option<String>,
    /// Save the effective configuration and exit
    #[arg(long)]
    pub write_config: Option<PathBuf>,
}

/// Outcome of reading the positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub kinds: KindSelection,
    pub visualize: Option<bool>,
    pub limit_keypoints: Option<bool>,
    pub focus_on_vehicle: Option<bool>,
    /// Human-readable fallbacks and coercions, in the order they happened.
    pub notices: Vec<String>,
}

fn kind_or_default<K>(token: Option<&str>, base: K, default: K, label: &str, notices: &mut Vec<String>) -> K
where
    K: FromStr + std::fmt::Display + Copy,
{
    match token {
        None => base,
        Some(t) => t.parse().unwrap_or_else(|_| {
            let family = label.to_lowercase();
            notices.push(format!("Invalid {label} Type! Use {default} {family}"));
            default
        }),
    }
}

/// `1` is on, any other integer is off. Anything else keeps `default`.
pub fn parse_flag(token: &str, name: &str, default: bool, notices: &mut Vec<String>) -> bool {
    match token.trim().parse::<i64>() {
        Ok(v) => v == 1,
        Err(_) => {
            notices.push(format!(
                "Invalid {name} flag '{token}'! Use {}",
                u8::from(default)
            ));
            default
        }
    }
}

/// Applies the positional tokens on top of `base`.
///
/// Missing tokens keep the `base` values; invalid ones fall back to the
/// built-in defaults. AKAZE pairs are coerced last.
pub fn resolve_positionals(cli: &Cli, base: &PipelineConfig) -> Resolved {
    let defaults = KindSelection::default();
    let fallback = PipelineConfig::default();
    let mut notices = Vec::new();

    let mut kinds = KindSelection {
        detector: kind_or_default::<DetectorKind>(
            cli.detector.as_deref(),
            base.kinds.detector,
            defaults.detector,
            "Detector",
            &mut notices,
        ),
        descriptor: kind_or_default::<DescriptorKind>(
            cli.descriptor.as_deref(),
            base.kinds.descriptor,
            defaults.descriptor,
            "Descriptor",
            &mut notices,
        ),
        matcher: kind_or_default::<MatcherKind>(
            cli.matcher.as_deref(),
            base.kinds.matcher,
            defaults.matcher,
            "Matcher",
            &mut notices,
        ),
        selector: kind_or_default::<SelectorKind>(
            cli.selector.as_deref(),
            base.kinds.selector,
            defaults.selector,
            "Selector",
            &mut notices,
        ),
    };

    let visualize = cli
        .visualize
        .as_deref()
        .map(|t| parse_flag(t, "visualize", fallback.visualize, &mut notices));
    let limit_keypoints = cli
        .limit
        .as_deref()
        .map(|t| parse_flag(t, "limit", fallback.limit_keypoints, &mut notices));
    let focus_on_vehicle = cli
        .focus
        .as_deref()
        .map(|t| parse_flag(t, "focus", fallback.focus_on_vehicle, &mut notices));

    notices.extend(kinds.coerce());

    Resolved {
        kinds,
        visualize,
        limit_keypoints,
        focus_on_vehicle,
        notices,
    }
}

impl Cli {
    /// Folds positional tokens and named options into `config`, returning
    /// the notices to show the user.
    pub fn apply(&self, config: &mut PipelineConfig) -> Vec<String> {
        let resolved = resolve_positionals(self, config);
        config.kinds = resolved.kinds;
        if let Some(v) = resolved.visualize {
            config.visualize = v;
        }
        if let Some(v) = resolved.limit_keypoints {
            config.limit_keypoints = v;
        }
        if let Some(v) = resolved.focus_on_vehicle {
            config.focus_on_vehicle = v;
        }

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(ext) = &self.extension {
            config.extension = ext.clone();
        }
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if let Some(width) = self.fill_width {
            config.fill_width = width;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.report.is_some() {
            config.report = self.report.clone();
        }
        if self.interactive {
            config.interactive = true;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        resolved.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cli(tokens: &[&str]) -> Cli {
        let mut argv = vec!["camtrack"];
        argv.extend_from_slice(tokens);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn no_arguments_keep_defaults() {
        let mut cfg = PipelineConfig::default();
        let notices = cli(&[]).apply(&mut cfg);
        assert!(notices.is_empty());
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn all_positionals() {
        let mut cfg = PipelineConfig::default();
        let notices = cli(&["FAST", "BRIEF", "MAT_FLANN", "SEL_KNN", "0", "1", "0"]).apply(&mut cfg);
        assert!(notices.is_empty());
        assert_eq!(cfg.kinds.detector, DetectorKind::Fast);
        assert_eq!(cfg.kinds.descriptor, DescriptorKind::Brief);
        assert_eq!(cfg.kinds.matcher, MatcherKind::Flann);
        assert_eq!(cfg.kinds.selector, SelectorKind::KNearest);
        assert!(!cfg.visualize);
        assert!(cfg.limit_keypoints);
        assert!(!cfg.focus_on_vehicle);
    }

    #[test]
    fn invalid_tokens_fall_back_with_notice() {
        let mut cfg = PipelineConfig::default();
        cfg.kinds.detector = DetectorKind::Orb;
        let notices = cli(&["SURF", "LATCH", "MAT_X", "SEL_Y"]).apply(&mut cfg);
        assert_eq!(
            notices,
            vec![
                "Invalid Detector Type! Use SHITOMASI detector",
                "Invalid Descriptor Type! Use BRISK descriptor",
                "Invalid Matcher Type! Use MAT_BF matcher",
                "Invalid Selector Type! Use SEL_NN selector",
            ]
        );
        assert_eq!(cfg.kinds, KindSelection::default());
    }

    #[test]
    fn flag_tokens() {
        let mut notices = Vec::new();
        assert!(parse_flag("1", "visualize", false, &mut notices));
        assert!(!parse_flag("0", "visualize", true, &mut notices));
        assert!(!parse_flag("7", "visualize", true, &mut notices));
        assert!(!parse_flag("-1", "visualize", true, &mut notices));
        assert!(notices.is_empty());

        assert!(parse_flag("yes", "visualize", true, &mut notices));
        assert_eq!(notices, vec!["Invalid visualize flag 'yes'! Use 1"]);
    }

    #[test]
    fn akaze_is_coerced_after_parsing() {
        let mut cfg = PipelineConfig::default();
        let notices = cli(&["AKAZE", "ORB"]).apply(&mut cfg);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("AKAZE detector"));
        assert_eq!(cfg.kinds.descriptor, DescriptorKind::Akaze);
    }

    #[test]
    fn named_options_override_config() {
        let mut cfg = PipelineConfig::default();
        let parsed = cli(&[
            "HARRIS",
            "--data-dir",
            "/data",
            "--start",
            "3",
            "--end",
            "5",
            "--fill-width",
            "6",
            "--threads",
            "2",
            "--interactive",
            "--log-level",
            "debug",
        ]);
        parsed.apply(&mut cfg);
        assert_eq!(cfg.kinds.detector, DetectorKind::Harris);
        assert_eq!(cfg.data_dir, PathBuf::from("/data"));
        assert_eq!((cfg.start, cfg.end, cfg.fill_width, cfg.threads), (3, 5, 6, 2));
        assert!(cfg.interactive);
        assert_eq!(cfg.log_level, "debug");
    }

    proptest! {
        #[test]
        fn any_integer_flag_is_on_only_for_one(v in any::<i32>()) {
            let mut notices = Vec::new();
            prop_assert_eq!(parse_flag(&v.to_string(), "limit", false, &mut notices), v == 1);
            prop_assert!(notices.is_empty());
        }
    }
}
