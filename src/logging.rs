use tracing_subscriber::EnvFilter;

/// Instala el subscriber de `tracing` (que también recoge los registros de
/// `log`). `RUST_LOG` tiene prioridad sobre `level`. Devuelve `false` si ya
/// había un subscriber global instalado.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    match tracing_subscriber::fmt().with_env_filter(filter)
                                   .with_target(false)
                                   .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            eprintln!("[batchflow] logging not initialised: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        init("debug");
        assert!(!init("info"));
    }
}
