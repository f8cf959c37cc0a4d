use tableau_common::{MAX_POINT_LIGHTS, PointLight};

use crate::uniforms::{
    LightField, ShaderUniforms, USE_LIGHTING, UniformValue, point_light_uniform,
};

/// Turn lighting on and forward up to [`MAX_POINT_LIGHTS`] lights.
///
/// Unused slots are uploaded as inactive. Returns how many lights were sent.
pub fn upload_lights<T: ShaderUniforms + ?Sized>(target: &mut T, lights: &[PointLight]) -> usize {
    if lights.len() > MAX_POINT_LIGHTS {
        tracing::warn!(
            given = lights.len(),
            max = MAX_POINT_LIGHTS,
            "extra point lights dropped"
        );
    }
    target.set_uniform(USE_LIGHTING, UniformValue::Bool(true));

    let sent = lights.len().min(MAX_POINT_LIGHTS);
    for (i, light) in lights.iter().take(MAX_POINT_LIGHTS).enumerate() {
        let set = |target: &mut T, field, value| {
            target.set_uniform(&point_light_uniform(i, field), value);
        };
        set(target, LightField::Position, UniformValue::Vec3(light.position));
        set(target, LightField::Ambient, UniformValue::Vec3(light.ambient));
        set(target, LightField::Diffuse, UniformValue::Vec3(light.diffuse));
        set(target, LightField::Specular, UniformValue::Vec3(light.specular));
        set(target, LightField::Active, UniformValue::Bool(light.active));
    }
    for i in sent..MAX_POINT_LIGHTS {
        target.set_uniform(
            &point_light_uniform(i, LightField::Active),
            UniformValue::Bool(false),
        );
    }
    sent
}

pub fn set_lighting_enabled<T: ShaderUniforms + ?Sized>(target: &mut T, enabled: bool) {
    target.set_uniform(USE_LIGHTING, UniformValue::Bool(enabled));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use glam::Vec3;

    fn light(x: f32) -> PointLight {
        PointLight {
            position: Vec3::new(x, 4.0, 4.0),
            ..PointLight::default()
        }
    }

    #[test]
    fn forwards_every_field() {
        let mut gpu = RecordingBackend::new();
        let sent = upload_lights(&mut gpu, &[light(-4.0), light(4.0)]);

        assert_eq!(sent, 2);
        assert_eq!(gpu.uniform(USE_LIGHTING), Some(UniformValue::Bool(true)));
        assert_eq!(
            gpu.uniform("pointLights[1].position"),
            Some(UniformValue::Vec3(Vec3::new(4.0, 4.0, 4.0)))
        );
        assert_eq!(
            gpu.uniform("pointLights[0].ambient"),
            Some(UniformValue::Vec3(Vec3::splat(0.05)))
        );
        assert_eq!(
            gpu.uniform("pointLights[0].bActive"),
            Some(UniformValue::Bool(true))
        );
        assert_eq!(
            gpu.uniform("pointLights[2].bActive"),
            Some(UniformValue::Bool(false))
        );
        assert_eq!(gpu.uniform("pointLights[2].position"), None);
    }

    #[test]
    fn drops_lights_past_the_limit() {
        let mut gpu = RecordingBackend::new();
        let lights: Vec<_> = (0..6).map(|i| light(i as f32)).collect();
        assert_eq!(upload_lights(&mut gpu, &lights), MAX_POINT_LIGHTS);
        assert!(gpu.uniform("pointLights[3].position").is_some());
        assert!(gpu.uniform("pointLights[4].position").is_none());
    }

    #[test]
    fn lighting_can_be_switched_off() {
        let mut gpu = RecordingBackend::new();
        set_lighting_enabled(&mut gpu, false);
        assert_eq!(gpu.uniform(USE_LIGHTING), Some(UniformValue::Bool(false)));
    }
}
