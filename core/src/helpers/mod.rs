// Copyright (c) 2022-2023 The MobileCoin Foundation

/// encdec helper module for fixed-size byte arrays
pub(crate) mod arr {
    use encdec::Error;

    pub fn enc<const N: usize>(d: &[u8; N], buff: &mut [u8]) -> Result<usize, Error> {
        if buff.len() < d.len() {
            return Err(Error::Length);
        }

        buff[..d.len()].copy_from_slice(&d[..]);

        Ok(d.len())
    }

    pub fn enc_len<const N: usize>(d: &[u8; N]) -> Result<usize, Error> {
        Ok(d.len())
    }

    pub fn dec<const N: usize>(buff: &[u8]) -> Result<([u8; N], usize), Error> {
        if buff.len() < N {
            return Err(Error::Length);
        }

        let mut d = [0u8; N];
        d.copy_from_slice(&buff[..N]);

        Ok((d, N))
    }
}

/// encdec helper module for compressed ristretto points
pub(crate) mod pt {
    use curve25519_dalek::ristretto::CompressedRistretto;
    use encdec::Error;

    pub fn enc(p: &CompressedRistretto, buff: &mut [u8]) -> Result<usize, Error> {
        let d = p.as_bytes();

        if buff.len() < d.len() {
            return Err(Error::Length);
        }

        buff[..d.len()].copy_from_slice(d);

        Ok(d.len())
    }

    pub fn enc_len(_p: &CompressedRistretto) -> Result<usize, Error> {
        Ok(32)
    }

    pub fn dec(buff: &[u8]) -> Result<(CompressedRistretto, usize), Error> {
        let mut d = [0u8; 32];

        if buff.len() < d.len() {
            return Err(Error::Length);
        }

        d.copy_from_slice(&buff[..32]);

        Ok((CompressedRistretto(d), 32))
    }
}

#[cfg(test)]
mod test {
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_COMPRESSED;

    use super::*;

    #[test]
    fn arr_short_buffer() {
        let mut b = [0u8; 3];
        assert!(arr::enc(&[1u8, 2, 3, 4], &mut b).is_err());
        assert!(arr::dec::<4>(&b).is_err());
    }

    #[test]
    fn pt_encode_decode() {
        let mut b = [0u8; 32];
        pt::enc(&RISTRETTO_BASEPOINT_COMPRESSED, &mut b).unwrap();

        let (p, n) = pt::dec(&b).unwrap();
        assert_eq!(n, 32);
        assert_eq!(p, RISTRETTO_BASEPOINT_COMPRESSED);

        assert!(pt::dec(&b[..31]).is_err());
    }
}
