use serde::{Deserialize, Serialize};

use crate::entities::{encastes, gallos};
use crate::models::EstadoEncaste;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GalloDto {
    pub id: String,
    pub nombre: String,
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
    pub foto_gallo: Option<String>,
    pub foto_padre: Option<String>,
    pub foto_madre: Option<String>,
    pub foto_abuelo: Option<String>,
    pub foto_abuela: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<gallos::Model> for GalloDto {
    fn from(model: gallos::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.nombre,
            padre: model.padre,
            madre: model.madre,
            abuelo: model.abuelo,
            abuela: model.abuela,
            placa_gallo: model.placa_gallo,
            placa_padre: model.placa_padre,
            placa_madre: model.placa_madre,
            placa_abuelo: model.placa_abuelo,
            placa_abuela: model.placa_abuela,
            fecha_marcado: model.fecha_marcado,
            color_general: model.color_general,
            color_patas: model.color_patas,
            tipo_cresta: model.tipo_cresta,
            tipo_brida: model.tipo_brida,
            numero_brida: model.numero_brida,
            color_brida: model.color_brida,
            ubicacion_brida: model.ubicacion_brida,
            descripcion: model.descripcion,
            foto_gallo: model.foto_gallo,
            foto_padre: model.foto_padre,
            foto_madre: model.foto_madre,
            foto_abuelo: model.foto_abuelo,
            foto_abuela: model.foto_abuela,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EncasteDto {
    pub id: String,
    pub fecha_encaste: String,
    pub hora_encaste: Option<String>,
    pub placa_padrote: String,
    pub placa_gallina: String,
    pub descripcion_brida: Option<String>,
    pub imagen_padrote: Option<String>,
    pub imagen_gallina: Option<String>,
    pub imagen_nido: Option<String>,
    pub fecha_primer_huevo: Option<String>,
    pub fecha_ultimo_huevo: Option<String>,
    pub total_huevos: i32,
    pub fecha_inicio_incubacion: Option<String>,
    pub cantidad_pollos_nacidos: i32,
    pub fecha_nacimiento: Option<String>,
    pub estado: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<encastes::Model> for EncasteDto {
    fn from(model: encastes::Model) -> Self {
        let estado = EstadoEncaste::of(&model).as_str().to_string();
        Self {
            id: model.id,
            fecha_encaste: model.fecha_encaste,
            hora_encaste: model.hora_encaste,
            placa_padrote: model.placa_padrote,
            placa_gallina: model.placa_gallina,
            descripcion_brida: model.descripcion_brida,
            imagen_padrote: model.imagen_padrote,
            imagen_gallina: model.imagen_gallina,
            imagen_nido: model.imagen_nido,
            fecha_primer_huevo: model.fecha_primer_huevo,
            fecha_ultimo_huevo: model.fecha_ultimo_huevo,
            total_huevos: model.total_huevos,
            fecha_inicio_incubacion: model.fecha_inicio_incubacion,
            cantidad_pollos_nacidos: model.cantidad_pollos_nacidos,
            fecha_nacimiento: model.fecha_nacimiento,
            estado,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub total_gallos: u64,
    pub total_encastes: u64,
    pub total_huevos: i64,
    pub total_pollos: i64,
    pub encastes_activos: u64,
    pub encastes_completados: u64,
    pub tasa_exito: String,
    pub tendencia_gallos: String,
    pub tendencia_encastes: String,
}

#[derive(Debug, Deserialize)]
pub struct ClaveRequest {
    pub clave_edicion: String,
}

#[derive(Debug, Deserialize)]
pub struct CambioClaveRequest {
    #[serde(default)]
    pub clave_actual: String,
    #[serde(default)]
    pub clave_nueva: String,
    #[serde(default)]
    pub confirmacion: String,
}
