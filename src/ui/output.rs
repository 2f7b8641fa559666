use crate::ui::Icons;
use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

/// Terminal styles, resolved once per process
struct Palette {
    heading: Style,
    ok: Style,
    failure: Style,
    accent: Style,
    faint: Style,
}

impl Palette {
    fn for_stdout() -> Self {
        let plain = Style::new();
        if !(console::Term::stdout().is_term() && console::colors_enabled()) {
            return Self { heading: plain, ok: plain, failure: plain, accent: plain, faint: plain };
        }
        Self {
            heading: plain.cyan().bold(),
            ok: plain.green().bold(),
            failure: plain.red().bold(),
            accent: plain.blue(),
            faint: plain.bright_black(),
        }
    }
}

fn palette() -> &'static Palette {
    static PALETTE: OnceLock<Palette> = OnceLock::new();
    PALETTE.get_or_init(Palette::for_stdout)
}

pub fn header(text: &str) {
    println!("{} {}", Icons::HOUSE, text.style(palette().heading));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(palette().ok));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(palette().failure));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO.style(palette().accent), label.style(palette().faint), value);
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(palette().heading));
}

pub fn dim(text: &str) -> String {
    text.style(palette().faint).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(palette().faint), value);
}
