use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_solace_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("SOLACE_PORT");
        env::remove_var("SOLACE_BIND_ADDR");
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("TTS_API_KEY");
        env::remove_var("SOLACE_MODEL");
        env::remove_var("SOLACE_TTS_MODEL");
        env::remove_var("SOLACE_TTS_VOICE");
        env::remove_var("SOLACE_CACHE_CAPACITY");
        env::remove_var("SOLACE_CACHE_TTL_SECS");
        env::remove_var("SOLACE_CHAT_MAX_ATTEMPTS");
        env::remove_var("SOLACE_TTS_MAX_ATTEMPTS");
        env::remove_var("SUPABASE_URL");
        env::remove_var("SUPABASE_SERVICE_KEY");
        env::remove_var("SOLACE_PROJECT_ID");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8787);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert!(config.genai_api_key.is_none());
    assert!(config.tts_api_key.is_none());
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.tts_model, DEFAULT_TTS_MODEL);
    assert_eq!(config.tts_voice, DEFAULT_TTS_VOICE);
    assert_eq!(config.cache_capacity, 100);
    assert_eq!(config.cache_ttl, Duration::from_secs(300));
    assert_eq!(config.chat_max_attempts, 3);
    assert_eq!(config.tts_max_attempts, 5);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:8787");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_solace_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 8787);
    assert!(config.genai_api_key.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_custom_port() {
    clear_solace_env();

    with_env_vars(&[("SOLACE_PORT", "3000")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 3000);
    });
}

#[test]
#[serial]
fn test_tts_key_falls_back_to_genai_key() {
    clear_solace_env();

    with_env_vars(&[("GEMINI_API_KEY", "shared-key")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.genai_api_key.as_deref(), Some("shared-key"));
        assert_eq!(config.tts_api_key.as_deref(), Some("shared-key"));
    });
}

#[test]
#[serial]
fn test_dedicated_tts_key_wins() {
    clear_solace_env();

    with_env_vars(
        &[("GEMINI_API_KEY", "chat-key"), ("TTS_API_KEY", "voice-key")],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.tts_api_key.as_deref(), Some("voice-key"));
        },
    );
}

#[test]
#[serial]
fn test_blank_api_key_treated_as_absent() {
    clear_solace_env();

    with_env_vars(&[("GEMINI_API_KEY", "   ")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.genai_api_key.is_none());
    });
}

#[test]
#[serial]
fn test_cache_overrides() {
    clear_solace_env();

    with_env_vars(
        &[
            ("SOLACE_CACHE_CAPACITY", "16"),
            ("SOLACE_CACHE_TTL_SECS", "60"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.cache_capacity, 16);
            assert_eq!(config.cache_ttl, Duration::from_secs(60));
        },
    );
}

#[test]
#[serial]
fn test_retry_bound_overrides() {
    clear_solace_env();

    with_env_vars(
        &[
            ("SOLACE_CHAT_MAX_ATTEMPTS", "4"),
            ("SOLACE_TTS_MAX_ATTEMPTS", "2"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.chat_max_attempts, 4);
            assert_eq!(config.tts_max_attempts, 2);
        },
    );
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_solace_env();

    with_env_vars(&[("SOLACE_PORT", "0")], || {
        let result = Config::from_env();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_solace_env();

    with_env_vars(&[("SOLACE_PORT", "not_a_port")], || {
        let result = Config::from_env();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bind_addr() {
    clear_solace_env();

    with_env_vars(&[("SOLACE_BIND_ADDR", "not.an.ip.address")], || {
        let result = Config::from_env();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    });
}

#[test]
fn test_validate_rejects_zero_capacity() {
    let config = Config {
        cache_capacity: 0,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBound { .. }));
}

#[test]
fn test_validate_rejects_zero_attempts() {
    let config = Config {
        chat_max_attempts: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        tts_max_attempts: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}
