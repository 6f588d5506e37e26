use clap::{ArgAction, Parser};

use quickshot::app::{self, App};
use quickshot::config::Settings;
use quickshot::selection::SelectionRect;

#[derive(Parser, Debug)]
#[command(name = "quickshot")]
#[command(version, about = "Hotkey-driven desktop screenshot utility with region selection")]
struct Cli {
    /// Listen for the configured global hotkeys (background mode)
    #[arg(long, short = 'l', action = ArgAction::SetTrue)]
    listen: bool,

    /// Capture the full screen once and exit
    #[arg(long, short = 'f', action = ArgAction::SetTrue)]
    full: bool,

    /// Capture a region once and exit, e.g. --region 100,100,640x480
    #[arg(long, short = 'r', value_name = "X,Y,WxH")]
    region: Option<String>,

    /// Write a documented default config file and exit
    #[arg(long, action = ArgAction::SetTrue)]
    init_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.init_config {
        let path = Settings::create_default_file()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let settings = Settings::load();

    if let Some(spec) = cli.region {
        let rect: SelectionRect = spec
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid region '{spec}': {e}"))?;
        let app = App::new(settings);
        let success = app.capture_region(rect)?;
        println!("{}", success.file.path.display());
        return Ok(());
    }

    if cli.full {
        let app = App::new(settings);
        let success = app.capture_full()?;
        println!("{}", success.file.path.display());
        return Ok(());
    }

    if cli.listen {
        log::info!("starting hotkey listener");
        app::run_listen(settings)?;
        return Ok(());
    }

    // No flags: show usage
    println!("quickshot: hotkey-driven screenshot utility");
    println!();
    println!("Usage:");
    println!("  quickshot --listen             Listen for the configured global hotkeys");
    println!("  quickshot --full               Capture the full screen once");
    println!("  quickshot --region X,Y,WxH     Capture a region once (e.g. 100,100,640x480)");
    println!("  quickshot --init-config        Write a documented default config file");
    println!("  quickshot --help               Show help");
    println!();
    println!("Default hotkeys (configurable in ~/.config/quickshot/config.toml):");
    println!("  print_screen         Full-screen capture");
    println!("  ctrl+print_screen    Region capture");

    Ok(())
}
