//! Earth-in-glass viewer.
//!
//! Usage: `earthglass [PRESET | OPTIONS.toml]`. Presets are `night_lights`
//! (the default) and `lite`; a `.toml` path loads options from disk, with
//! missing fields taking their defaults.

use earthglass::{Options, Viewer};

fn main() {
    env_logger::init();

    let arg = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "night_lights".to_owned());

    let options = match Options::resolve(&arg) {
        Ok(options) => options,
        Err(e) => {
            log::error!("{e} (presets: {})", Options::PRESETS.join(", "));
            std::process::exit(1);
        }
    };

    if let Err(e) = Viewer::builder().with_options(options).build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
