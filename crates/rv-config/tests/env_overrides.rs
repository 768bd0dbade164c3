use figment::Jail;
use rv_config::{StorageBackend, VaultConfig};

#[test]
fn env_vars_map_to_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("REPORTVAULT_DATABASE__PATH", "/tmp/env.db");
        jail.set_env("REPORTVAULT_STORAGE__BACKEND", "memory");
        jail.set_env("REPORTVAULT_ARCHIVE__CHUNK_SIZE", "4096");

        let config = VaultConfig::load().expect("config loads");
        assert_eq!(config.database.path, "/tmp/env.db");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.archive.chunk_size, 4096);
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(".reportvault").map_err(|e| e.to_string())?;
        jail.create_file(
            ".reportvault/config.toml",
            "[locks]\nexpiry_secs = 10\n",
        )?;
        jail.set_env("REPORTVAULT_LOCKS__EXPIRY_SECS", "45");

        let config = VaultConfig::load().expect("config loads");
        assert_eq!(config.locks.expiry_secs, 45);
        Ok(())
    });
}
