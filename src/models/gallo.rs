/// Leg-band type accepted by the gallo form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoBrida {
    Brida,
    Tairra,
}

impl TipoBrida {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "brida" => Some(Self::Brida),
            "tairra" => Some(Self::Tairra),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brida => "brida",
            Self::Tairra => "tairra",
        }
    }
}

/// Text fields collected from the gallo form. Every field is optional at the
/// transport level; `nombre` is required on create, and on edit a `None` (or
/// blank) field keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GalloInput {
    pub nombre: Option<String>,
    pub padre: Option<String>,
    pub madre: Option<String>,
    pub abuelo: Option<String>,
    pub abuela: Option<String>,
    pub placa_gallo: Option<String>,
    pub placa_padre: Option<String>,
    pub placa_madre: Option<String>,
    pub placa_abuelo: Option<String>,
    pub placa_abuela: Option<String>,
    pub fecha_marcado: Option<String>,
    pub color_general: Option<String>,
    pub color_patas: Option<String>,
    pub tipo_cresta: Option<String>,
    pub tipo_brida: Option<String>,
    pub numero_brida: Option<String>,
    pub color_brida: Option<String>,
    pub ubicacion_brida: Option<String>,
    pub descripcion: Option<String>,
}

impl GalloInput {
    /// Stores a form field by name, ignoring unknown names so photo slots and
    /// the inline edit key can share the same multipart body.
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "nombre" => &mut self.nombre,
            "padre" => &mut self.padre,
            "madre" => &mut self.madre,
            "abuelo" => &mut self.abuelo,
            "abuela" => &mut self.abuela,
            "placa_gallo" => &mut self.placa_gallo,
            "placa_padre" => &mut self.placa_padre,
            "placa_madre" => &mut self.placa_madre,
            "placa_abuelo" => &mut self.placa_abuelo,
            "placa_abuela" => &mut self.placa_abuela,
            "fecha_marcado" => &mut self.fecha_marcado,
            "color_general" => &mut self.color_general,
            "color_patas" => &mut self.color_patas,
            "tipo_cresta" => &mut self.tipo_cresta,
            "tipo_brida" => &mut self.tipo_brida,
            "numero_brida" => &mut self.numero_brida,
            "color_brida" => &mut self.color_brida,
            "ubicacion_brida" => &mut self.ubicacion_brida,
            "descripcion" => &mut self.descripcion,
            _ => return,
        };
        *slot = Some(value);
    }
}
