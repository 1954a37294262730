//! Cifrado de credenciales de login
//!
//! El proveedor de identidad espera el JSON de credenciales cifrado con su
//! clave pública RSA, en bloques de 214 bytes, cada bloque en base64 y todos
//! unidos por comas. El primitivo de cifrado queda detrás de [`CredentialCipher`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::{pkcs8::DecodePublicKey, Pkcs1v15Encrypt, RsaPublicKey};
use serde::Serialize;

use crate::utils::errors::{crypto_error, AppResult};

/// Tamaño máximo de bloque en texto plano
pub const CHUNK_SIZE: usize = 214;

/// Cifra un bloque con la clave pública (base64 DER, sin cabeceras PEM) del proveedor
pub trait CredentialCipher: Send + Sync {
    fn encrypt_block(&self, public_key: &str, block: &[u8]) -> AppResult<Vec<u8>>;
}

/// RSA PKCS#1 v1.5
#[derive(Debug, Default, Clone)]
pub struct RsaPkcs1Cipher;

impl CredentialCipher for RsaPkcs1Cipher {
    fn encrypt_block(&self, public_key: &str, block: &[u8]) -> AppResult<Vec<u8>> {
        let decoded = urlencoding::decode(public_key).map_err(crypto_error)?;
        let compact: String = decoded.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD.decode(compact).map_err(crypto_error)?;
        let key = RsaPublicKey::from_public_key_der(&der).map_err(crypto_error)?;

        let mut rng = rand::thread_rng();
        key.encrypt(&mut rng, Pkcs1v15Encrypt, block)
            .map_err(crypto_error)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload<'a> {
    user_identity: &'a str,
    reset_flag: bool,
    encrypted_pwd: String,
}

/// Hash MD5 en hexadecimal minúsculas, tal como lo espera el proveedor
pub fn md5_hex(value: &str) -> String {
    format!("{:x}", md5::compute(value.as_bytes()))
}

/// JSON compacto de credenciales antes de cifrar
pub fn login_plaintext(phone: &str, password: &str) -> AppResult<String> {
    let payload = LoginPayload {
        user_identity: phone,
        reset_flag: false,
        encrypted_pwd: md5_hex(password),
    };
    Ok(serde_json::to_string(&payload)?)
}

/// Valor del campo `encryptData` del formulario de login
pub fn encrypt_credentials(
    cipher: &dyn CredentialCipher,
    public_key: &str,
    phone: &str,
    password: &str,
) -> AppResult<String> {
    let plaintext = login_plaintext(phone, password)?;

    let chunks = plaintext
        .as_bytes()
        .chunks(CHUNK_SIZE)
        .map(|chunk| cipher.encrypt_block(public_key, chunk).map(|bytes| STANDARD.encode(bytes)))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(chunks.join(","))
}
