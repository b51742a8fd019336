#![allow(bad_style)]

mod inflate;
mod png;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// Random bytes drawn from a small alphabet, so that compressors find plenty
/// of matches at every distance.
fn rand_compressible(count: usize, alphabet: u8) -> Vec<u8> {
  rand_bytes(count).into_iter().map(|b| b % alphabet).collect()
}
