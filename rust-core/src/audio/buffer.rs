//! Lock-free ring buffer for interleaved audio
//!
//! Carries samples between the cpal callbacks and the processing thread

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Single-producer, single-consumer sample buffer
pub struct AudioRingBuffer {
    producer: HeapProducer<f64>,
    consumer: HeapConsumer<f64>,
}

impl AudioRingBuffer {
    /// Create a buffer holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<f64>::new(capacity).split();
        Self { producer, consumer }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        (
            AudioProducer {
                producer: self.producer,
            },
            AudioConsumer {
                consumer: self.consumer,
            },
        )
    }
}

/// Writing end
pub struct AudioProducer {
    producer: HeapProducer<f64>,
}

impl AudioProducer {
    /// Write samples, returning how many fit
    pub fn write(&mut self, samples: &[f64]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Write f32 device samples without allocating
    pub fn write_f32(&mut self, samples: &[f32]) -> usize {
        let mut chunk = [0.0f64; 256];
        let mut written = 0;
        for block in samples.chunks(chunk.len()) {
            for (dst, &src) in chunk.iter_mut().zip(block) {
                *dst = src as f64;
            }
            let n = self.producer.push_slice(&chunk[..block.len()]);
            written += n;
            if n < block.len() {
                break;
            }
        }
        written
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Reading end
pub struct AudioConsumer {
    consumer: HeapConsumer<f64>,
}

impl AudioConsumer {
    /// Read up to `buffer.len()` samples, returning how many were read
    pub fn read(&mut self, buffer: &mut [f64]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    /// Fill f32 device samples without allocating; missing samples become silence
    pub fn read_f32(&mut self, data: &mut [f32]) -> usize {
        let mut chunk = [0.0f64; 256];
        let mut read = 0;
        for block in data.chunks_mut(chunk.len()) {
            let n = self.consumer.pop_slice(&mut chunk[..block.len()]);
            for (dst, &src) in block.iter_mut().zip(&chunk[..n]) {
                *dst = src as f32;
            }
            for dst in block[n..].iter_mut() {
                *dst = 0.0;
            }
            read += n;
        }
        read
    }

    /// Number of samples available
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_write_read() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(1024).split();

        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(producer.write(&data), 5);
        assert_eq!(consumer.len(), 5);

        let mut output = vec![0.0; 5];
        assert_eq!(consumer.read(&mut output), 5);
        assert_eq!(output, data);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_ring_buffer_overflow() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(10).split();

        let written = producer.write(&[1.0; 20]);
        assert!(written <= 10);
        assert_eq!(producer.free_len(), 0);

        let mut output = vec![0.0; 20];
        assert_eq!(consumer.read(&mut output), written);
    }

    #[test]
    fn test_f32_conversion_spans_chunks() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(1000).split();

        let input: Vec<f32> = (0..600).map(|i| i as f32 * 0.5).collect();
        assert_eq!(producer.write_f32(&input), 600);

        // Ask for more than is available: tail is zero-filled
        let mut output = vec![9.0f32; 700];
        assert_eq!(consumer.read_f32(&mut output), 600);
        assert_eq!(&output[..600], &input[..]);
        assert!(output[600..].iter().all(|&s| s == 0.0));
    }
}
