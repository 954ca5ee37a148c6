//! Terminal setup/teardown, mirroring the teacher's `tui.rs`: enter the
//! alternate screen and raw mode, run the app, and restore the terminal no
//! matter how the app loop exits.

use crate::app::App;

pub fn run(app: App) -> std::io::Result<()> {
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}
