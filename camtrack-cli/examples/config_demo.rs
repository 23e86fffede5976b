use camtrack_cli::{backend_for, PipelineConfig};
use camtrack_core::{DescriptorKind, DetectorKind, KindSelection, MatcherKind, SelectorKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("camtrack configuration demo");
    println!("===========================\n");

    let presets = [
        ("kitti_default", KindSelection::default()),
        (
            "native_fast_brief",
            KindSelection {
                detector: DetectorKind::Fast,
                descriptor: DescriptorKind::Brief,
                matcher: MatcherKind::BruteForce,
                selector: SelectorKind::KNearest,
            },
        ),
        (
            "native_orb",
            KindSelection {
                detector: DetectorKind::Orb,
                descriptor: DescriptorKind::Orb,
                matcher: MatcherKind::BruteForce,
                selector: SelectorKind::NearestNeighbor,
            },
        ),
    ];

    for (name, kinds) in presets {
        let config = PipelineConfig {
            kinds,
            ..Default::default()
        };
        config.validate()?;

        let backend = backend_for(&config.kinds);
        let support = match backend.check_support(&config.kinds) {
            Ok(()) => format!("runs on the {} backend", backend.name()),
            Err(e) => e.to_string(),
        };
        println!("{name}: {}", config.summary());
        println!("   {support}");

        config.save_toml(format!("{name}.toml"))?;
        config.save_json(format!("{name}.json"))?;
        let reloaded = PipelineConfig::load(format!("{name}.toml"))?;
        assert_eq!(reloaded, config);
    }

    println!("\nSaved TOML and JSON files for {} presets", presets.len());
    Ok(())
}
