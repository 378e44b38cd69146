use crate::{AppError, Value};
use bincode::{Decode, Encode};

/// Converts payload values of encoded columns to and from their stored bytes.
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
    fn encode(&self, value: &Value) -> Result<Vec<u8>, AppError>;
    fn decode(&self, bytes: &[u8]) -> Result<Value, AppError>;
}

/// bincode with the standard configuration.
#[derive(Copy, Clone, Debug, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, AppError> {
        encode_as(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, AppError> {
        decode_as(bytes)
    }
}

pub fn encode_as<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, AppError> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

/// Decodes `bytes` completely, leftover bytes mean the payload was not written by this codec.
pub fn decode_as<T: Decode<()>>(bytes: &[u8]) -> Result<T, AppError> {
    let (value, read) = bincode::decode_from_slice::<T, _>(bytes, bincode::config::standard())?;
    if read != bytes.len() {
        return Err(AppError::Codec(format!("{} trailing bytes after payload of {} bytes", bytes.len() - read, read)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[derive(Debug, PartialEq, Encode, Decode)]
    struct Label {
        name: String,
        frames: Vec<u32>,
    }

    #[test]
    fn nested_payload_roundtrip() {
        let value = Value::List(vec![
            Value::from("walking"),
            Value::List(vec![Value::Integer(1), Value::Real(2.5), Value::Null]),
            Value::Blob(vec![0, 1, 2]),
        ]);
        let codec = BincodeCodec;
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn typed_payload_roundtrip() {
        let label = Label { name: "sitting".to_string(), frames: vec![3, 5, 8] };
        let bytes = encode_as(&label).unwrap();
        assert_eq!(decode_as::<Label>(&bytes).unwrap(), label);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = BincodeCodec.encode(&Value::from("x")).unwrap();
        bytes.push(0);
        let err = BincodeCodec.decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
    }

    #[test]
    fn garbage_is_a_codec_failure() {
        let err = BincodeCodec.decode(&[0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert!(BincodeCodec.decode(&[]).is_err());
    }
}
