use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_file_exists, settings_path, Settings};

pub fn run(init: bool) -> Result<()> {
    if init {
        if settings_file_exists() {
            println!("Settings file already exists: {}", settings_path().display());
        } else {
            save_settings(&Settings::default())?;
            println!("Wrote default settings to {}", settings_path().display());
        }
    }

    let settings = load_settings();
    println!("Settings file:         {}", settings_path().display());
    println!("Description column:    {}", settings.description_column);
    println!("Category column:       {}", settings.category_column);
    println!("Confidence threshold:  {}", settings.confidence_threshold);
    println!("Generic marker:        {}", settings.generic_marker);
    println!("Default category:      {}", settings.default_category);
    println!(
        "Reference file:        {}",
        settings.reference_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Rules file:            {}",
        settings.rules_file.as_deref().unwrap_or("(built-in)")
    );
    Ok(())
}
