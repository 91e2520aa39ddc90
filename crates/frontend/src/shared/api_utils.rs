//! Адреса backend для запросов из браузера

/// Порт backend по умолчанию (см. `[server]` в config.toml)
pub const API_PORT: u16 = 3000;

/// Базовый URL API, построенный по адресу текущей страницы
///
/// Например "http://localhost:3000"; пустая строка, если window недоступен.
pub fn api_base() -> String {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return String::new(),
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    format!("{}//{}:{}", protocol, hostname, API_PORT)
}

/// Полный URL по пути вида "/api/..."
pub fn api_url(path: &str) -> String {
    format!("{}{}", api_base(), path)
}
