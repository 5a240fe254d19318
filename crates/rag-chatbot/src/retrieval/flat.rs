//! Flat inner-product index over L2-normalised vectors

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::cmp::Ordering;

use crate::error::{Error, Result};

/// File magic for `vectors.idx`
pub const MAGIC: &[u8; 8] = b"RAGIDX01";

const HEADER_LEN: usize = MAGIC.len() + 4 + 4;

/// Scale `v` to unit length (norm + 1e-12 guards the zero vector)
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt() + 1e-12;
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Row-major matrix of normalised vectors
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build from raw vectors, normalising each row
    pub fn from_vectors(vectors: &[Vec<f32>]) -> Result<Self> {
        let dim = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::vector_db("cannot build an index from zero vectors"))?;
        if dim == 0 {
            return Err(Error::vector_db("embedding dimension is zero"));
        }

        let mut data = Vec::with_capacity(dim * vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(Error::vector_db(format!(
                    "dimension mismatch at row {}: expected {}, got {}",
                    i,
                    dim,
                    v.len()
                )));
            }
            let start = data.len();
            data.extend_from_slice(v);
            normalize(&mut data[start..]);
        }

        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Top `k` rows by inner product with the normalised query, best first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(Error::vector_db(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dim
            )));
        }

        let mut q = query.to_vec();
        normalize(&mut q);

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (i, row.iter().zip(&q).map(|(a, b)| a * b).sum()))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Serialise as magic, dim (u32 LE), count (u32 LE), rows (f32 LE)
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.data.len() * 4);
        buf.put_slice(MAGIC);
        buf.put_u32_le(self.dim as u32);
        buf.put_u32_le(self.len() as u32);
        for x in &self.data {
            buf.put_f32_le(*x);
        }
        buf.freeze()
    }

    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(Error::vector_db("not a vector index file"));
        }
        bytes.advance(MAGIC.len());
        let dim = bytes.get_u32_le() as usize;
        let count = bytes.get_u32_le() as usize;

        if dim == 0 || bytes.remaining() != dim * count * 4 {
            return Err(Error::vector_db(format!(
                "corrupt index: dim {} count {} but {} payload bytes",
                dim,
                count,
                bytes.remaining()
            )));
        }

        let mut data = Vec::with_capacity(dim * count);
        while bytes.has_remaining() {
            data.push(bytes.get_f32_le());
        }
        Ok(Self { dim, data })
    }
}
