//! Blocking test client for talking to a running shim.

use std::str;

#[derive(Debug)]
pub struct Reply {
    pub status: u32,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issue a GET (or HEAD when `head` is set) without following redirects.
pub fn request(url: &str, head: bool) -> Reply {
    let mut headers = Vec::new();
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(url).unwrap();
    easy.nobody(head).unwrap();
    easy.follow_location(false).unwrap();
    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    if let Some((k, v)) = line.split_once(':') {
                        headers.push((k.trim().to_string(), v.trim().to_string()));
                    }
                }
                true
            })
            .unwrap();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .unwrap();
        transfer.perform().unwrap();
    }
    let status = easy.response_code().unwrap();
    Reply {
        status,
        headers,
        body,
    }
}

pub fn get(url: &str) -> Reply {
    request(url, false)
}

pub fn head(url: &str) -> Reply {
    request(url, true)
}
