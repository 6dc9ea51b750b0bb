//! One VPC, three subnets, three ENIs, then an IGW attach. Exercises the
//! translator end to end through the public
//! [`hive_vpcd::ovn::OvnClient`] port instead of reaching into table
//! internals, the same way `bus::adapter`'s own tests drive it.

use hive_vpcd::domain::value_objects::{EniId, IgwId, SubnetId, VpcId};
use hive_vpcd::ovn::mock::MockOvnClient;
use hive_vpcd::ovn::OvnClient;
use hive_vpcd::Translator;
use std::sync::Arc;

#[tokio::test]
async fn three_subnets_three_enis_then_igw_attach() {
    let client = Arc::new(MockOvnClient::new());
    client.connect().await.unwrap();
    let translator = Translator::new(client.clone());

    let vpc_id = VpcId::from("vpc-integ1");
    translator.vpc_create(&vpc_id, Some("10.0.0.0/16"), 1000).await.unwrap();

    let subnets = [
        ("subnet-integ1", "10.0.1.0/24", "eni-integ1", "10.0.1.10", "02:00:00:aa:bb:01"),
        ("subnet-integ2", "10.0.2.0/24", "eni-integ2", "10.0.2.10", "02:00:00:aa:bb:02"),
        ("subnet-integ3", "10.0.3.0/24", "eni-integ3", "10.0.3.10", "02:00:00:aa:bb:03"),
    ];

    for (subnet_id, cidr, eni_id, ip, mac) in subnets {
        let subnet_id = SubnetId::from(subnet_id);
        translator.subnet_create(&subnet_id, &vpc_id, cidr).await.unwrap();
        translator
            .port_create(&EniId::from(eni_id), &subnet_id, ip, mac)
            .await
            .unwrap();
    }

    assert_eq!(client.list_switches().await.unwrap().len(), 3);
    assert_eq!(client.list_dhcp_options().await.unwrap().len(), 3);

    let router = client.get_router("vpc-vpc-integ1").await.unwrap().unwrap();
    assert_eq!(router.ports.len(), 3);

    let igw_id = IgwId::from("igw-000000000000000001");
    translator.igw_attach(&igw_id, &vpc_id).await.unwrap();

    assert_eq!(client.list_switches().await.unwrap().len(), 4);
    let router = client.get_router("vpc-vpc-integ1").await.unwrap().unwrap();
    assert_eq!(router.ports.len(), 4);
    assert_eq!(router.nat.len(), 1);
    assert_eq!(router.static_routes.len(), 1);
}
