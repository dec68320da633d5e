/// Example program to print the loaded configuration
///
/// Run with: cargo run -p lens-config --example print_config
use lens_config::{FeatureFlag, LensConfig};

fn main() {
    let config = LensConfig::load();

    println!("=== Lens Configuration ===\n");

    println!("Scoping Settings:");
    println!("  Click Debounce: {:?}", config.scoping.click_debounce());
    println!("  Hover Debounce: {:?}", config.scoping.hover_debounce());
    println!();

    println!("Overlay Settings:");
    println!("  Container Id: {}", config.overlay.container_id);
    println!("  Shadow Host Id: {}", config.overlay.shadow_host_id);
    println!("  Cursor: {}", config.overlay.cursor);
    println!();

    println!("Feature Flags:");
    for detail in FeatureFlag::all_details() {
        println!(
            "  {:<28} {:<5} ({})",
            detail.displayable_name,
            config.features.is_enabled(detail.id),
            detail.displayable_description
        );
    }
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
