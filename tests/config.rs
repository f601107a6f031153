// ABOUTME: Integration tests for configuration parsing and discovery.
// ABOUTME: Tests YAML parsing, repository entries and loading SSH keys from disk.

mod support;

use keyward::config::*;
use keyward::error::Error;
use std::path::PathBuf;

mod parsing {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = Config::from_yaml("{}").unwrap();
        assert!(config.ssh.is_none());
        assert!(config.known_hosts.is_none());
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
ssh:
  user: git
  private_key: ~/.ssh/id_ed25519
  public_key: ~/.ssh/id_ed25519.pub

known_hosts:
  - ./known_hosts
  - /etc/ssh/ssh_known_hosts

staging_dir: /run/keyward

repositories:
  - git@github.com:org/repo.git
  - url: ssh://git@example.com/infra.git
    bare: true
  - url: ssh://git@example.com:2222/tools.git
    dir: vendor/tools
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let ssh = config.ssh.as_ref().unwrap();
        assert_eq!(ssh.user.as_deref(), Some("git"));
        assert_eq!(ssh.private_key, Some(PathBuf::from("~/.ssh/id_ed25519")));
        assert_eq!(config.known_hosts.as_ref().unwrap().len(), 2);
        assert_eq!(config.staging_dir, Some(PathBuf::from("/run/keyward")));

        assert_eq!(
            config.repositories,
            vec![
                RepositoryConfig {
                    url: "git@github.com:org/repo.git".to_string(),
                    dir: PathBuf::from("repo"),
                    bare: false,
                },
                RepositoryConfig {
                    url: "ssh://git@example.com/infra.git".to_string(),
                    dir: PathBuf::from("infra.git"),
                    bare: true,
                },
                RepositoryConfig {
                    url: "ssh://git@example.com:2222/tools.git".to_string(),
                    dir: PathBuf::from("vendor/tools"),
                    bare: false,
                },
            ]
        );
    }

    #[test]
    fn repository_without_name_returns_error() {
        let yaml = r#"
repositories:
  - "ssh://example.com/"
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn repository_with_only_host_and_port_returns_error() {
        let yaml = r#"
repositories:
  - url: "ssh://git@example.com:2222"
    bare: true
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn invalid_yaml_returns_error() {
        let result = Config::from_yaml("ssh: [unclosed");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discovers_primary_filename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "staging_dir: /a\n").unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME_ALT), "staging_dir: /b\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.staging_dir, Some(PathBuf::from("/a")));
    }

    #[test]
    fn discovers_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".keyward")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME_DIR), "staging_dir: /c\n").unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.staging_dir, Some(PathBuf::from("/c")));
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
        let config = Config::discover_or_default(dir.path()).unwrap();
        assert!(config.ssh.is_none());
    }
}

mod keys {
    use super::*;

    #[test]
    fn remote_options_read_key_files() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("id_ed25519");
        std::fs::write(&key_path, support::PRIVATE_KEY).unwrap();

        let config = Config {
            ssh: Some(SshConfig {
                user: Some("deploy".to_string()),
                private_key: Some(key_path),
                public_key: None,
            }),
            ..Default::default()
        };

        let options = config.remote_options().unwrap();
        let ssh = options.ssh.unwrap();
        assert_eq!(ssh.user, "deploy");
        assert_eq!(ssh.private_key.as_deref(), Some(support::PRIVATE_KEY.as_bytes()));
        assert!(ssh.public_key.is_none());
    }

    #[test]
    fn tilde_paths_resolve_against_home() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join(".ssh")).unwrap();
        std::fs::write(home.path().join(".ssh/id_ed25519"), support::PRIVATE_KEY).unwrap();

        temp_env::with_var("HOME", Some(home.path()), || {
            let config = Config::from_yaml("ssh:\n  private_key: ~/.ssh/id_ed25519\n").unwrap();
            let options = config.remote_options().unwrap();
            assert!(options.ssh.unwrap().private_key.is_some());
        });
    }

    #[test]
    fn missing_key_file_fails() {
        let config = Config::from_yaml("ssh:\n  private_key: /nonexistent/keyward/key\n").unwrap();
        assert!(matches!(
            config.remote_options(),
            Err(Error::KeyLoadFailed { .. })
        ));
    }

    #[test]
    fn no_ssh_section_means_no_ssh_options() {
        let options = Config::default().remote_options().unwrap();
        assert!(options.ssh.is_none());
    }

    #[test]
    fn configured_known_hosts_replace_standard_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = support::write_known_hosts(
            dir.path(),
            &format!("git.example.com ssh-ed25519 {}\n", support::PUBLIC_KEY_BLOB),
        );
        let config = Config {
            known_hosts: Some(vec![path]),
            ..Default::default()
        };

        let known_hosts = config.known_hosts();
        assert_eq!(known_hosts.len(), 1);
        assert!(known_hosts.lookup("git.example.com").is_some());
    }
}
