use crate::entities::encastes;

/// Derived breeding-event status. Never stored; recomputed from the
/// incubation start date and the hatch count on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstadoEncaste {
    Pendiente,
    Incubando,
    Completado,
}

impl EstadoEncaste {
    #[must_use]
    pub const fn derive(fecha_inicio_incubacion: Option<&str>, cantidad_pollos_nacidos: i32) -> Self {
        if cantidad_pollos_nacidos > 0 {
            Self::Completado
        } else if fecha_inicio_incubacion.is_some() {
            Self::Incubando
        } else {
            Self::Pendiente
        }
    }

    #[must_use]
    pub fn of(encaste: &encastes::Model) -> Self {
        Self::derive(
            encaste.fecha_inicio_incubacion.as_deref(),
            encaste.cantidad_pollos_nacidos,
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Incubando => "incubando",
            Self::Completado => "completado",
        }
    }
}

/// Text fields collected from the encaste form. Mating date and both plate
/// identifiers are required on create; on edit, blank fields keep the stored
/// value.
#[derive(Debug, Clone, Default)]
pub struct EncasteInput {
    pub fecha_encaste: Option<String>,
    pub hora_encaste: Option<String>,
    pub placa_padrote: Option<String>,
    pub placa_gallina: Option<String>,
    pub descripcion_brida: Option<String>,
    pub fecha_primer_huevo: Option<String>,
    pub fecha_ultimo_huevo: Option<String>,
    pub total_huevos: Option<i32>,
    pub fecha_inicio_incubacion: Option<String>,
    pub cantidad_pollos_nacidos: Option<i32>,
    pub fecha_nacimiento: Option<String>,
}

impl EncasteInput {
    /// Stores a text form field by name. Numeric fields accept a blank value
    /// as zero; a non-numeric or negative value is reported to the caller.
    pub fn set_field(&mut self, name: &str, value: String) -> Result<(), String> {
        match name {
            "total_huevos" => {
                self.total_huevos = Some(parse_count("total_huevos", &value)?);
                return Ok(());
            }
            "cantidad_pollos_nacidos" => {
                self.cantidad_pollos_nacidos =
                    Some(parse_count("cantidad_pollos_nacidos", &value)?);
                return Ok(());
            }
            _ => {}
        }

        let slot = match name {
            "fecha_encaste" => &mut self.fecha_encaste,
            "hora_encaste" => &mut self.hora_encaste,
            "placa_padrote" => &mut self.placa_padrote,
            "placa_gallina" => &mut self.placa_gallina,
            "descripcion_brida" => &mut self.descripcion_brida,
            "fecha_primer_huevo" => &mut self.fecha_primer_huevo,
            "fecha_ultimo_huevo" => &mut self.fecha_ultimo_huevo,
            "fecha_inicio_incubacion" => &mut self.fecha_inicio_incubacion,
            "fecha_nacimiento" => &mut self.fecha_nacimiento,
            _ => return Ok(()),
        };
        *slot = Some(value);
        Ok(())
    }
}

fn parse_count(field: &str, value: &str) -> Result<i32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let parsed: i32 = trimmed
        .parse()
        .map_err(|_| format!("{field} debe ser un número entero"))?;
    if parsed < 0 {
        return Err(format!("{field} no puede ser negativo"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estado_pendiente_sin_incubacion() {
        assert_eq!(EstadoEncaste::derive(None, 0), EstadoEncaste::Pendiente);
    }

    #[test]
    fn test_estado_incubando() {
        assert_eq!(
            EstadoEncaste::derive(Some("2025-04-01"), 0),
            EstadoEncaste::Incubando
        );
    }

    #[test]
    fn test_estado_completado_con_pollos() {
        assert_eq!(
            EstadoEncaste::derive(Some("2025-04-01"), 7),
            EstadoEncaste::Completado
        );
        // hatch count wins even if the incubation date was never recorded
        assert_eq!(EstadoEncaste::derive(None, 3), EstadoEncaste::Completado);
    }

    #[test]
    fn test_parse_count_blank_is_zero() {
        let mut input = EncasteInput::default();
        input.set_field("total_huevos", "  ".to_string()).unwrap();
        assert_eq!(input.total_huevos, Some(0));
    }

    #[test]
    fn test_parse_count_rejects_negative() {
        let mut input = EncasteInput::default();
        assert!(input.set_field("total_huevos", "-3".to_string()).is_err());
        assert!(
            input
                .set_field("cantidad_pollos_nacidos", "pollo".to_string())
                .is_err()
        );
    }
}
