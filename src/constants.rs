pub mod seguridad {
    /// Documented default edit key. Seeded lazily the first time the gate
    /// runs for a user without a stored key, and restored by `reset-clave`.
    pub const DEFAULT_CLAVE_EDICION: &str = "gallos2024";

    pub const MIN_CLAVE_LEN: usize = 6;

    pub const MIN_PASSWORD_LEN: usize = 8;

    /// One-time login codes expire after this many seconds.
    pub const LOGIN_CODE_TTL_SECS: u64 = 300;
}

pub mod fotos {
    pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

    /// Multipart body cap for record forms (fields + photos).
    pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

    pub const GALLO_SLOTS: &[&str] = &[
        "foto_gallo",
        "foto_padre",
        "foto_madre",
        "foto_abuelo",
        "foto_abuela",
    ];

    pub const ENCASTE_SLOTS: &[&str] = &["imagen_padrote", "imagen_gallina", "imagen_nido"];
}

pub mod dashboard {

    pub const TREND_WINDOW_DAYS: i64 = 30;
}
