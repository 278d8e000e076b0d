/// Sink for the beam brightness, written once per frame.
pub trait LightOutput {
    fn set_intensity(&mut self, intensity: f32);
}

/// Light sink that just remembers the last value written.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StoredLight {
    pub intensity: f32,
    pub writes: u64,
}

impl LightOutput for StoredLight {
    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
        self.writes += 1;
    }
}

impl<L: LightOutput + ?Sized> LightOutput for &mut L {
    fn set_intensity(&mut self, intensity: f32) {
        (**self).set_intensity(intensity);
    }
}
