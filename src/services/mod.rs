// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod auditor;
pub mod crawler;
pub mod db;
pub mod dispatch;
pub mod lighthouse;
pub mod links;
pub mod logging;
pub mod memory_store;
pub mod orchestrator;
pub mod status;
pub mod store;
