// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::audit::DeviceType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page × device audit handed to a dispatcher.
/// The `pending` row identified by `audit_id` exists before the job is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAuditJob {
    pub audit_id: Uuid,
    pub website_id: Uuid,
    pub page_url: String,
    pub device: DeviceType,
}
