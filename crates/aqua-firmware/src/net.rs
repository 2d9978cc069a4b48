//! WiFi association and the dashboard's TCP endpoint

use core::task::Poll;

use alloc::string::String;
use aqua_core::app_state::{AppError, describe};
use aqua_core::config::InternetConfig;
use aqua_core::http::{Acceptor, Connection};
use aqua_core::link::{LINK_RETRY_MS, retry_until_ok};
use embassy_executor::Spawner;
use embassy_futures::poll_once;
use embassy_net::tcp::{self, State, TcpSocket};
use embassy_net::{Config as NetConfig, DhcpConfig, Ipv4Address, Runner, Stack, StackResources};
use embassy_time::{Delay, Duration};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::Controller as RadioController;
use esp_radio::wifi::{self, ClientConfig, ModeConfig, WifiController, WifiDevice};
use log::{debug, info, warn};
use static_cell::StaticCell;

const SOCKET_BUFFER_SIZE: usize = 2048;

/// Give up on a client that stops reading or writing for this long.
const SOCKET_TIMEOUT_SECS: u64 = 10;

fn network_error<E: core::fmt::Debug>(context: &str, error: E) -> AppError {
    AppError::Network(describe(context, error))
}

static RADIO_CONTROLLER: StaticCell<RadioController<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static RX_BUFFER: StaticCell<[u8; SOCKET_BUFFER_SIZE]> = StaticCell::new();
static TX_BUFFER: StaticCell<[u8; SOCKET_BUFFER_SIZE]> = StaticCell::new();

/// Start the radio and the network stack, and spawn the stack runner.
///
/// The returned controller must be kept alive for the link to stay up.
pub fn start_network(
    spawner: &Spawner,
    wifi_peripheral: WIFI<'static>,
) -> Result<(WifiController<'static>, Stack<'static>), AppError> {
    let radio = esp_radio::init().map_err(|e| network_error("radio init", e))?;
    let radio = RADIO_CONTROLLER.init(radio);

    let (controller, interfaces) = wifi::new(radio, wifi_peripheral, Default::default())
        .map_err(|e| network_error("WiFi driver", e))?;

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let resources = NET_RESOURCES.init(StackResources::<3>::new());
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        NetConfig::dhcpv4(DhcpConfig::default()),
        resources,
        seed,
    );

    spawner.spawn(net_task(runner).map_err(|e| network_error("net task spawn", e))?);

    Ok((controller, stack))
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

/// Associate with the access point and wait for a DHCP lease.
///
/// Both steps are retried every second until they succeed.
pub async fn connect(
    controller: &mut WifiController<'static>,
    stack: Stack<'static>,
    internet: &InternetConfig<'_>,
) -> Result<Ipv4Address, AppError> {
    let client = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(String::from(internet.ssid))
            .with_password(String::from(internet.password)),
    );
    controller
        .set_config(&client)
        .map_err(|e| network_error("WiFi config", e))?;
    controller
        .start_async()
        .await
        .map_err(|e| network_error("WiFi start", e))?;

    let mut delay = Delay;
    retry_until_ok(&mut delay, LINK_RETRY_MS, "WiFi association", async |_| {
        info!("Connecting to WiFi...");
        controller.connect_async().await
    })
    .await;
    info!("Connected to WiFi!");

    let lease = retry_until_ok(&mut delay, LINK_RETRY_MS, "DHCP lease", async |_| {
        stack.config_v4().ok_or("no address yet")
    })
    .await;

    let address = lease.address.address();
    info!("IP address: {}", address);
    Ok(address)
}

/// Failure on an accepted TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetError(tcp::Error);

impl core::fmt::Display for NetError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "TCP error: {:?}", self.0)
    }
}

impl core::error::Error for NetError {}

impl embedded_io::Error for NetError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0 {
            tcp::Error::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
        }
    }
}

/// One listening socket on the dashboard port, polled once per cycle.
pub struct TcpAcceptor {
    socket: TcpSocket<'static>,
    port: u16,
}

impl TcpAcceptor {
    pub fn new(stack: Stack<'static>, port: u16) -> Self {
        let rx = RX_BUFFER.init([0; SOCKET_BUFFER_SIZE]);
        let tx = TX_BUFFER.init([0; SOCKET_BUFFER_SIZE]);
        let mut socket = TcpSocket::new(stack, rx, tx);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));
        Self { socket, port }
    }
}

impl Acceptor for TcpAcceptor {
    type Connection<'a> = TcpConnection<'a>;

    fn accept_pending(&mut self) -> Option<Self::Connection<'_>> {
        match self.socket.state() {
            State::Closed => {
                // Starts listening; completes only if a handshake already finished
                match poll_once(self.socket.accept(self.port)) {
                    Poll::Ready(Ok(())) => {}
                    Poll::Ready(Err(e)) => {
                        warn!("Listening on port {} failed: {:?}", self.port, e);
                        return None;
                    }
                    Poll::Pending => return None,
                }
            }
            State::Listen | State::SynReceived => return None,
            State::Established | State::CloseWait => {}
            other => {
                // Left over from a connection that never finished closing
                debug!("Resetting socket in state {:?}", other);
                self.socket.abort();
                return None;
            }
        }

        if let Some(remote) = self.socket.remote_endpoint() {
            debug!("Client connected from {}", remote);
        }
        Some(TcpConnection {
            socket: &mut self.socket,
        })
    }
}

pub struct TcpConnection<'a> {
    socket: &'a mut TcpSocket<'static>,
}

impl embedded_io::ErrorType for TcpConnection<'_> {
    type Error = NetError;
}

impl embedded_io_async::Read for TcpConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket.read(buf).await.map_err(NetError)
    }
}

impl embedded_io_async::Write for TcpConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket.write(buf).await.map_err(NetError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket.flush().await.map_err(NetError)
    }
}

impl Connection for TcpConnection<'_> {
    async fn close(self) {
        self.socket.close();
        if let Err(e) = self.socket.flush().await {
            debug!("Close flush failed: {:?}", e);
        }
        self.socket.abort();
    }
}
