//! Extracción de parámetros de URLs de redirección
//!
//! El proveedor de identidad devuelve `pubKey` y `token` dentro del header
//! `Location`, a veces en la query y a veces en el fragmento.

/// Valor crudo (sin decodificar) del parámetro `key`, buscando primero en la query y luego en el fragmento
pub fn get_url_param(url: &str, key: &str) -> Option<String> {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };

    let query = without_fragment.split_once('?').map(|(_, q)| q);

    query
        .and_then(|q| find_param(q, key))
        .or_else(|| fragment.and_then(|f| find_param(strip_fragment_path(f), key)))
}

// Los fragmentos de SPA suelen tener forma `#/ruta?token=...`
fn strip_fragment_path(fragment: &str) -> &str {
    fragment.split_once('?').map(|(_, q)| q).unwrap_or(fragment)
}

fn find_param(pairs: &str, key: &str) -> Option<String> {
    pairs
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}
