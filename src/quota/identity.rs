//! Client Identity Derivation
//!
//! The rate-limiting key is derived from network-origin headers: the first
//! hop of the forwarded-address chain, then a real-IP header, then a shared
//! `"unknown"` sentinel. Multiple users behind one NAT or proxy therefore
//! share a bucket; that trade-off is intentional.

use axum::http::HeaderMap;

use crate::types::ClientId;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Derive the quota bucket for a request from its origin headers
pub fn client_id_from_headers(headers: &HeaderMap) -> ClientId {
    if let Some(forwarded) = header_str(headers, FORWARDED_FOR) {
        // The chain lists the original client first; later hops are proxies
        if let Some(first_hop) = forwarded.split(',').next() {
            let first_hop = first_hop.trim();
            if !first_hop.is_empty() {
                return ClientId::new(first_hop);
            }
        }
    }

    if let Some(real_ip) = header_str(headers, REAL_IP) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return ClientId::new(real_ip);
        }
    }

    ClientId::unknown()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
