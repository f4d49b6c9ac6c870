/// Sample rate the realtime API expects for `pcm16` input audio.
pub const PCM16_SAMPLE_RATE: u32 = 24_000;
/// `pcm16` input audio is always mono.
pub const PCM16_CHANNELS: u16 = 1;
/// Bytes per `pcm16` sample (signed 16-bit little-endian).
pub const PCM16_SAMPLE_WIDTH: usize = 2;

