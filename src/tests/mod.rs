mod navigation_tests;
mod runner_tests;

use crate::config::ProbeConfig;
use std::path::Path;

/// Default configuration writing screenshots under `dir`
fn config_in(dir: &Path) -> ProbeConfig {
    ProbeConfig {
        screenshots_dir: dir.join("screenshots"),
        store_dir: dir.join("tests"),
        ..ProbeConfig::default()
    }
}

/// Full landmark skeleton around `body`
fn layout(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>\
         <header>Site</header><main>{}</main><footer>(c)</footer>\
         </body></html>",
        title, body
    )
}
