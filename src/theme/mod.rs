//! Theme system for human-mode output.

use console::Style;

/// Visual theme for `wcm` human-mode output.
///
/// Centralizes styles for consistent rendering.
pub struct WcmTheme {
    // Status markers
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub info: Style,

    // Component styles
    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub muted: Style,
    pub port: Style,
    pub busid: Style,
    pub key: Style,
    pub attached: Style,
    pub detached: Style,
}

impl WcmTheme {
    /// Theme with colors enabled or forced off.
    #[must_use]
    pub fn new(color: bool) -> Self {
        let s = |style: Style| style.force_styling(color);
        Self {
            success: s(Style::new().green().bold()),
            error: s(Style::new().red().bold()),
            warning: s(Style::new().yellow().bold()),
            info: s(Style::new().blue().bold()),
            header: s(Style::new().cyan().bold().underlined()),
            label: s(Style::new().dim()),
            value: s(Style::new().bold()),
            muted: s(Style::new().black().bright()),
            port: s(Style::new().cyan().bold()),
            busid: s(Style::new().yellow().bold()),
            key: s(Style::new().magenta()),
            attached: s(Style::new().green()),
            detached: s(Style::new().dim()),
        }
    }
}

impl Default for WcmTheme {
    fn default() -> Self {
        Self::new(console::colors_enabled())
    }
}
