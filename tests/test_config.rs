use std::time::Duration;

use rawhttp::config::Config;

#[test]
fn test_config_env() {
    unsafe {
        std::env::remove_var("RAWHTTP_CONFIG");
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:42069");

    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");

    unsafe {
        std::env::set_var("RAWHTTP_CONFIG", "/definitely/not/here.yaml");
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var("RAWHTTP_CONFIG");
        std::env::remove_var("LISTEN");
    }
}

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.log_level().unwrap(), tracing::Level::INFO);
    assert_eq!(cfg.upstream, "http://httpbin.org");
    assert_eq!(cfg.video_path, "assets/vim.mp4");
    assert!(cfg.server_options().read_timeout.is_none());
    assert!(cfg.server_options().limits.max_request_bytes.is_none());
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml(
        "listen_addr: \"0.0.0.0:8080\"\nlog_level: debug\nread_timeout_secs: 5\nmax_request_bytes: 8192\nvideo_path: /srv/clip.mp4\n",
    )
    .unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level().unwrap(), tracing::Level::DEBUG);

    let options = cfg.server_options();
    assert_eq!(options.read_timeout, Some(Duration::from_secs(5)));
    assert_eq!(options.limits.max_request_bytes, Some(8192));
    assert_eq!(options.limits.chunk_size, 1024);
    assert_eq!(cfg.video_path, "/srv/clip.mp4");
    // unspecified fields keep their defaults
    assert_eq!(cfg.upstream, "http://httpbin.org");
}

#[test]
fn test_config_rejects_unknown_log_level() {
    assert!(Config::from_yaml("log_level: loud\n").is_err());
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("rawhttp-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "listen_addr: \"127.0.0.1:9000\"\n").unwrap();

    let cfg = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
}
