use easel_common::{EntityUuid, Transform};
use easel_ecs::{Camera, Light, LineGenerator, LineRenderer, MeshRenderer, QuadRenderer, Tag};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Top-level scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SceneDocument {
    pub scene: String,
    #[serde(default)]
    pub entities: Vec<EntityDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineDocument {
    pub vertices: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshDocument {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjMeshDocument {
    pub path: String,
}

/// One entity and whichever components it carries. Absent components are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    #[serde(rename = "Entity")]
    pub uuid: EntityUuid,
    #[serde(rename = "TagComponent", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(rename = "TransformComponent", default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(rename = "CameraComponent", default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(rename = "QuadRendererComponent", default, skip_serializing_if = "Option::is_none")]
    pub quad_renderer: Option<QuadRenderer>,
    #[serde(rename = "LineComponent", default, skip_serializing_if = "Option::is_none")]
    pub line: Option<LineDocument>,
    #[serde(rename = "LineRendererComponent", default, skip_serializing_if = "Option::is_none")]
    pub line_renderer: Option<LineRenderer>,
    #[serde(rename = "LineGeneratorComponent", default, skip_serializing_if = "Option::is_none")]
    pub line_generator: Option<LineGenerator>,
    #[serde(rename = "MeshComponent", default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshDocument>,
    #[serde(rename = "ObjMeshComponent", default, skip_serializing_if = "Option::is_none")]
    pub obj_mesh: Option<ObjMeshDocument>,
    #[serde(rename = "MeshRendererComponent", default, skip_serializing_if = "Option::is_none")]
    pub mesh_renderer: Option<MeshRenderer>,
    #[serde(rename = "LightComponent", default, skip_serializing_if = "Option::is_none")]
    pub light: Option<Light>,
}

impl EntityDocument {
    pub fn new(uuid: EntityUuid) -> Self {
        Self {
            uuid,
            tag: None,
            transform: None,
            camera: None,
            quad_renderer: None,
            line: None,
            line_renderer: None,
            line_generator: None,
            mesh: None,
            obj_mesh: None,
            mesh_renderer: None,
            light: None,
        }
    }
}
