// Felles byggere for syntetiske økter (1 Hz).
#![allow(dead_code)]

use intervalgraph_core::{Sample, Stream};

/// Bygger en strøm fra (fart km/t, antall sekunder)-segmenter.
/// Puls: 130 i rolige partier, stigende fra 150 i drag.
pub fn session(parts: &[(f64, usize)]) -> Stream {
    let mut samples = Vec::new();
    let mut t = 0usize;
    for &(speed, secs) in parts {
        for k in 0..secs {
            let bpm = if speed > 10.0 { 150.0 + k as f64 * 0.15 } else { 130.0 };
            samples.push(Sample::new(t as f64, speed, bpm));
            t += 1;
        }
    }
    Stream::new(samples).expect("syntetisk strøm skal være gyldig")
}

/// 120 s oppvarming på 6 km/t, deretter 4 × (90 s på `fast`, 120 s på 6).
pub fn four_repeats(fast: f64) -> Stream {
    repeats(fast, &[90, 90, 90, 90])
}

/// Som `four_repeats`, men med én dragvarighet per drag.
pub fn repeats(fast: f64, plateaus: &[usize]) -> Stream {
    let mut parts = vec![(6.0, 120)];
    for &secs in plateaus {
        parts.push((fast, secs));
        parts.push((6.0, 120));
    }
    session(&parts)
}

/// 300 s på 7 km/t, deretter 4 × (240 s på 15, 120 s på 7).
pub fn four_by_four() -> Stream {
    let mut parts = vec![(7.0, 300)];
    for _ in 0..4 {
        parts.push((15.0, 240));
        parts.push((7.0, 120));
    }
    session(&parts)
}
