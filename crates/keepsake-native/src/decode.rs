use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use keepsake_core::{BatchId, DecodeError, DecodedImage};

/// One finished decode, tagged with its slot in the batch.
pub struct Decoded {
    pub batch: BatchId,
    pub index: usize,
    pub result: Result<DecodedImage, DecodeError>,
}

pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let img = image::load_from_memory(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let rgba = img.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Decode every file on its own thread. Completions arrive on `tx` in
/// whatever order the threads finish.
pub fn spawn_decoders(batch: BatchId, paths: &[PathBuf], tx: &Sender<Decoded>) {
    for (index, path) in paths.iter().enumerate() {
        let worker_tx = tx.clone();
        let path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("decode-{index}"))
            .spawn(move || {
                let result = std::fs::read(&path)
                    .map_err(|e| DecodeError::Malformed(format!("{}: {e}", path.display())))
                    .and_then(|bytes| decode_bytes(&bytes));
                send(&worker_tx, Decoded {
                    batch,
                    index,
                    result,
                });
            });
        if let Err(e) = spawned {
            report_spawn_failure(tx, batch, index, &e);
        }
    }
}

/// A decoder that never started still reports back, so the queue settles.
fn report_spawn_failure(tx: &Sender<Decoded>, batch: BatchId, index: usize, err: &io::Error) {
    log::error!("could not start decoder for item {index}: {err}");
    send(tx, Decoded {
        batch,
        index,
        result: Err(DecodeError::Malformed(err.to_string())),
    });
}

fn send(tx: &Sender<Decoded>, done: Decoded) {
    let (batch, index) = (done.batch, done.index);
    if tx.send(done).is_err() {
        log::debug!("decode of batch {batch} item {index} dropped: receiver gone");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png_to_rgba() {
        let decoded = decode_bytes(&png(3, 2)).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.rgba.len(), 3 * 2 * 4);
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(decode_bytes(&[]), Err(DecodeError::Empty));
        assert!(matches!(
            decode_bytes(b"definitely not an image"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn every_item_reports_back_even_when_missing() {
        let (tx, rx) = mpsc::channel();
        let paths = vec![
            PathBuf::from("/nonexistent/a.png"),
            PathBuf::from("/nonexistent/b.png"),
        ];
        spawn_decoders(BatchId(1), &paths, &tx);
        drop(tx);
        let mut indices: Vec<usize> = rx.iter().map(|d| d.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn spawn_failures_report_a_failed_decode() {
        let (tx, rx) = mpsc::channel();
        let err = io::Error::new(io::ErrorKind::WouldBlock, "no threads left");
        report_spawn_failure(&tx, BatchId(3), 2, &err);
        let done = rx.try_recv().unwrap();
        assert_eq!((done.batch, done.index), (BatchId(3), 2));
        assert!(matches!(done.result, Err(DecodeError::Malformed(msg)) if msg.contains("no threads left")));
    }

    #[test]
    fn sending_after_the_receiver_is_gone_is_harmless() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        send(&tx, Decoded {
            batch: BatchId(1),
            index: 0,
            result: Err(DecodeError::Empty),
        });
    }
}
