use orbit_shapes::{AppConfig, config::HELP};

fn main() -> anyhow::Result<()> {
    match AppConfig::from_env()? {
        Some(config) => orbit_shapes::run(config),
        None => {
            println!("{}", HELP);
            Ok(())
        }
    }
}
