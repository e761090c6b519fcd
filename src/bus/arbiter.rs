use tracing::trace;

use super::{assert_single_completion, BusRequest, BusResponse, ProtocolError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    #[default]
    Idle,
    GrantM0,
    GrantM1,
}

/// Fixed-priority arbiter for two masters sharing one slave channel.
///
/// Master 0 (the CPU) wins whenever it requests; master 1 (the DMA) is
/// granted only when master 0 is quiet. The grant is registered, so a
/// request sampled on one edge appears on the slave channel after the
/// next. The grant is held until the slave accepts, and the response
/// is registered back to the originating master for one cycle. A
/// master is not re-granted in the cycle its response is presented, as
/// it still holds valid while it observes the completion.
#[derive(Debug, Default)]
pub struct Arbiter {
    state: ArbiterState,
    slave_req: BusRequest,
    m0_resp: BusResponse,
    m1_resp: BusResponse,
}

impl Arbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ArbiterState {
        self.state
    }

    /// Request currently driven onto the shared slave channel
    pub fn slave_request(&self) -> BusRequest {
        self.slave_req
    }

    pub fn m0_response(&self) -> BusResponse {
        self.m0_resp
    }

    pub fn m1_response(&self) -> BusResponse {
        self.m1_resp
    }

    pub fn clock_edge(&mut self, m0: &BusRequest, m1: &BusRequest, slave: &BusResponse) {
        m0.assert_valid("arbiter m0");
        m1.assert_valid("arbiter m1");
        if slave.ready && !self.slave_req.valid {
            panic!(
                "bus protocol violation on shared channel: {}",
                ProtocolError::ReadyWithoutRequest
            );
        }

        let m0_requesting = m0.valid && !self.m0_resp.ready;
        let m1_requesting = m1.valid && !self.m1_resp.ready;
        self.m0_resp = BusResponse::waiting();
        self.m1_resp = BusResponse::waiting();

        let granted = match self.state {
            ArbiterState::Idle => {
                self.slave_req = BusRequest::idle();
                self.state = if m0_requesting {
                    ArbiterState::GrantM0
                } else if m1_requesting {
                    ArbiterState::GrantM1
                } else {
                    ArbiterState::Idle
                };
                return;
            }
            ArbiterState::GrantM0 => m0,
            ArbiterState::GrantM1 => m1,
        };

        if self.slave_req.valid && slave.ready {
            trace!(
                state = ?self.state,
                addr = format_args!("{:#010x}", self.slave_req.addr),
                we = self.slave_req.we,
                "shared bus transaction complete"
            );
            let resp = BusResponse::ready(slave.rdata);
            match self.state {
                ArbiterState::GrantM0 => self.m0_resp = resp,
                _ => self.m1_resp = resp,
            }
            self.slave_req = BusRequest::idle();
            self.state = ArbiterState::Idle;
        } else if granted.valid {
            self.slave_req = *granted;
        } else {
            // Granted master withdrew before acceptance
            self.slave_req = BusRequest::idle();
            self.state = ArbiterState::Idle;
        }
        assert_single_completion(&self.m0_resp, &self.m1_resp);
    }
}
