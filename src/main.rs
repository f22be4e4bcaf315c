use chip8_vm::{
    emulator::{self, RunOutcome},
    peripherals::DummyPeripherals,
    Chip8,
};

fn main() {
    env_logger::init();
    let config = cli::parse_args();

    let rom = match io::load_rom(&config.chip8_program_path) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("{}: {}", config.chip8_program_path, e);
            std::process::exit(1);
        }
    };
    log::info!("Loaded {rom:?}");

    let mut chip8 = match Chip8::new(&rom, config.machine.compatibility) {
        Ok(chip8) => chip8,
        Err(e) => {
            eprintln!("{}: {}", config.chip8_program_path, e);
            std::process::exit(1);
        }
    };

    let mut screen = terminal::TerminalScreen::new(config.render);
    let outcome = emulator::run(
        &mut chip8,
        &config.machine,
        &mut DummyPeripherals,
        &mut screen,
        &mut DummyPeripherals,
        config.max_steps,
    );

    // Show the final state of the screen.
    print!("{}", chip8.framebuffer());

    if let RunOutcome::Faulted(fault) = outcome {
        eprintln!("{}: {}", config.chip8_program_path, fault);
        std::process::exit(2);
    }
}

mod io {
    use std::{error::Error, fs, path::Path};

    use chip8_vm::rom::Rom;

    pub fn load_rom(path: impl AsRef<Path>) -> Result<Rom, Box<dyn Error>> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Rom::from_bytes(&name, &bytes)?)
    }
}

mod terminal {
    use std::io::Write;

    use chip8_vm::{
        display::{DISPLAY_PIXELS, DISPLAY_WIDTH_PIXELS},
        peripherals::Screen,
    };

    /// Redraws the screen in place on stdout using ANSI escapes.
    pub struct TerminalScreen {
        enabled: bool,
    }

    impl TerminalScreen {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }
    }

    impl Screen for TerminalScreen {
        fn draw_frame(&mut self, pixels: &[bool; DISPLAY_PIXELS]) {
            if !self.enabled {
                return;
            }
            let mut frame = String::from("\x1B[H");
            for row in pixels.chunks(DISPLAY_WIDTH_PIXELS) {
                frame.extend(row.iter().map(|&p| if p { '#' } else { ' ' }));
                frame.push('\n');
            }
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(frame.as_bytes()).and_then(|_| stdout.flush()) {
                log::warn!("Failed to draw frame: {e}");
            }
        }
    }
}

mod cli {
    use chip8_vm::{config::DEFAULT_STEPS_PER_SECOND, CompatibilityMode, Config};
    use clap::{Parser, ValueEnum};

    #[derive(Debug)]
    pub struct AppConfig {
        pub chip8_program_path: String,
        pub machine: Config,
        pub max_steps: Option<u64>,
        pub render: bool,
    }

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum Mode {
        /// Shifts read VY and copy the result into VX (COSMAC VIP)
        Legacy,
        /// Shifts operate on VX in place
        Modern,
    }

    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    struct Args {
        /// Path to the rom to emulate
        #[arg(name = "chip8_program_path", value_name = "CHIP-8_PROGRAM_PATH")]
        chip8_program_path: String,

        /// Shift instruction behaviour
        #[arg(long, value_enum, default_value_t = Mode::Modern)]
        mode: Mode,

        /// Instructions executed per second, 0 for unthrottled
        #[arg(long, default_value_t = DEFAULT_STEPS_PER_SECOND)]
        steps_per_second: u32,

        /// Stop after this many instructions
        #[arg(long)]
        max_steps: Option<u64>,

        /// Draw the screen to the terminal while running
        #[arg(long)]
        render: bool,
    }

    pub fn parse_args() -> AppConfig {
        let args = Args::parse();
        AppConfig {
            chip8_program_path: args.chip8_program_path,
            machine: Config {
                compatibility: match args.mode {
                    Mode::Legacy => CompatibilityMode::Legacy,
                    Mode::Modern => CompatibilityMode::Modern,
                },
                steps_per_second: args.steps_per_second,
            },
            max_steps: args.max_steps,
            render: args.render,
        }
    }
}
